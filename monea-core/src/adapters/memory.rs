//! In-memory adapters
//!
//! `MemoryStore` implements the ledger port over plain maps, and
//! `FixedSmsSource` replays a scripted inbox. They back the integration
//! tests and any embedder that has not wired a native store yet.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{
    Account, BankCode, Category, Error, FailedExtraction, StatementImportRecord, Transaction,
    TransactionType,
};
use crate::ports::{HistoricalQuery, LedgerStore, PermissionStatus, RawSms, SmsCapability};

#[derive(Default)]
struct StoreInner {
    accounts: HashMap<Uuid, Account>,
    transactions: HashMap<Uuid, Transaction>,
    categories: HashMap<Uuid, Category>,
    failed: HashMap<Uuid, FailedExtraction>,
    statement_imports: Vec<StatementImportRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/debug helper: every transaction in insertion-independent order
    pub fn all_transactions(&self) -> Vec<Transaction> {
        let inner = self.inner.lock().unwrap();
        let mut txs: Vec<_> = inner.transactions.values().cloned().collect();
        txs.sort_by_key(|t| t.transaction_date);
        txs
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_accounts(&self) -> Result<Vec<Account>> {
        let inner = self.inner.lock().unwrap();
        let mut accounts: Vec<_> = inner.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.inner.lock().unwrap().accounts.get(&id).cloned())
    }

    async fn find_account_by_number(&self, account_number: &str) -> Result<Option<Account>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .accounts
            .values()
            .find(|a| a.account_number == account_number)
            .cloned())
    }

    async fn find_accounts_by_bank(&self, bank_code: BankCode) -> Result<Vec<Account>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .accounts
            .values()
            .filter(|a| a.bank_code == bank_code)
            .cloned()
            .collect())
    }

    async fn create_account(&self, account: &Account) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account_balance(&self, id: Uuid, balance: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| Error::store(anyhow::anyhow!("no such account: {id}")))?;
        account.balance = balance;
        Ok(())
    }

    async fn touch_account_synced(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| Error::store(anyhow::anyhow!("no such account: {id}")))?;
        account.last_synced_at = Some(at);
        Ok(())
    }

    async fn create_transaction(&self, tx: &Transaction) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .insert(tx.id, tx.clone());
        Ok(())
    }

    async fn create_transactions(&self, txs: &[Transaction]) -> Result<()> {
        // Single lock, single insertion pass: the batch is atomic
        let mut inner = self.inner.lock().unwrap();
        for tx in txs {
            inner.transactions.insert(tx.id, tx.clone());
        }
        Ok(())
    }

    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference: &str,
    ) -> Result<Option<Transaction>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .transactions
            .values()
            .find(|t| t.account_id == account_id && t.reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn find_by_amount_date_window(
        &self,
        account_id: Uuid,
        amount: i64,
        direction: TransactionType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .transactions
            .values()
            .filter(|t| {
                t.account_id == account_id
                    && t.amount == amount
                    && t.transaction_type == direction
                    && t.transaction_date >= start
                    && t.transaction_date < end
            })
            .cloned()
            .collect())
    }

    async fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let inner = self.inner.lock().unwrap();
        let mut txs: Vec<_> = inner
            .transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        txs.sort_by_key(|t| t.transaction_date);
        Ok(txs)
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        Ok(self.inner.lock().unwrap().categories.values().cloned().collect())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create_category(&self, category: &Category) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn save_failed_extraction(&self, failed: &FailedExtraction) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .failed
            .insert(failed.id, failed.clone());
        Ok(())
    }

    async fn list_failed_extractions(&self) -> Result<Vec<FailedExtraction>> {
        let inner = self.inner.lock().unwrap();
        let mut failed: Vec<_> = inner.failed.values().cloned().collect();
        failed.sort_by_key(|f| f.first_seen_at);
        Ok(failed)
    }

    async fn delete_failed_extraction(&self, id: Uuid) -> Result<()> {
        self.inner.lock().unwrap().failed.remove(&id);
        Ok(())
    }

    async fn bump_failed_retry(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(failed) = inner.failed.get_mut(&id) {
            failed.retry_count += 1;
        }
        Ok(())
    }

    async fn statement_file_seen(&self, fingerprint: &str) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .statement_imports
            .iter()
            .any(|r| r.file_fingerprint == fingerprint))
    }

    async fn record_statement_import(&self, record: &StatementImportRecord) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .statement_imports
            .push(record.clone());
        Ok(())
    }
}

/// A scripted SMS inbox with configurable permissions
pub struct FixedSmsSource {
    messages: Mutex<Vec<RawSms>>,
    permissions: Mutex<PermissionStatus>,
    /// What `request_permissions` flips the status to
    grant_on_request: PermissionStatus,
}

impl FixedSmsSource {
    pub fn new(messages: Vec<RawSms>) -> Self {
        let granted = PermissionStatus {
            can_read_inbox: true,
            can_receive_push: true,
        };
        Self {
            messages: Mutex::new(messages),
            permissions: Mutex::new(granted),
            grant_on_request: granted,
        }
    }

    pub fn with_permissions(mut self, current: PermissionStatus, on_request: PermissionStatus) -> Self {
        self.permissions = Mutex::new(current);
        self.grant_on_request = on_request;
        self
    }

    pub fn push_message(&self, message: RawSms) {
        self.messages.lock().unwrap().push(message);
    }
}

#[async_trait]
impl SmsCapability for FixedSmsSource {
    async fn check_permissions(&self) -> Result<PermissionStatus> {
        Ok(*self.permissions.lock().unwrap())
    }

    async fn request_permissions(&self) -> Result<bool> {
        let mut permissions = self.permissions.lock().unwrap();
        let changed = *permissions != self.grant_on_request;
        *permissions = self.grant_on_request;
        Ok(changed)
    }

    async fn fetch_historical(&self, query: HistoricalQuery) -> Result<Vec<RawSms>> {
        let mut messages: Vec<_> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| match query.before {
                Some(bound) => m.received_at < bound,
                None => true,
            })
            .cloned()
            .collect();

        // Newest first, as the platform inbox query behaves
        messages.sort_by_key(|m| std::cmp::Reverse(m.received_at));
        messages.truncate(query.limit);
        Ok(messages)
    }
}
