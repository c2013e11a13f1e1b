//! Ledger store port - persistent record store abstraction
//!
//! The on-device storage engine is an external collaborator; this trait is
//! everything the engine asks of it. Implementations map their internal
//! failures into `Error::Store`, which the engine propagates without
//! retrying: a failing store is a collaborator malfunction, not something
//! ingestion can fix.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{
    Account, BankCode, Category, FailedExtraction, StatementImportRecord, Transaction,
    TransactionType,
};

#[async_trait]
pub trait LedgerStore: Send + Sync {
    // === Accounts ===

    async fn get_accounts(&self) -> Result<Vec<Account>>;

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    async fn find_account_by_number(&self, account_number: &str) -> Result<Option<Account>>;

    async fn find_accounts_by_bank(&self, bank_code: BankCode) -> Result<Vec<Account>>;

    async fn create_account(&self, account: &Account) -> Result<()>;

    /// Overwrite the cached balance
    async fn update_account_balance(&self, id: Uuid, balance: i64) -> Result<()>;

    async fn touch_account_synced(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    // === Transactions ===

    async fn create_transaction(&self, tx: &Transaction) -> Result<()>;

    /// Insert a batch atomically: either every transaction persists or none
    async fn create_transactions(&self, txs: &[Transaction]) -> Result<()>;

    /// Exact-reference lookup on one account
    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference: &str,
    ) -> Result<Option<Transaction>>;

    /// Window lookup for reference-less dedup: same account, amount and
    /// direction, transaction date within `[start, end)`
    async fn find_by_amount_date_window(
        &self,
        account_id: Uuid,
        amount: i64,
        direction: TransactionType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;

    async fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>>;

    // === Categories ===

    async fn get_categories(&self) -> Result<Vec<Category>>;

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>>;

    async fn create_category(&self, category: &Category) -> Result<()>;

    // === Failed extraction queue ===

    async fn save_failed_extraction(&self, failed: &FailedExtraction) -> Result<()>;

    async fn list_failed_extractions(&self) -> Result<Vec<FailedExtraction>>;

    async fn delete_failed_extraction(&self, id: Uuid) -> Result<()>;

    /// Increment retry_count after another unsuccessful reprocess
    async fn bump_failed_retry(&self, id: Uuid) -> Result<()>;

    // === Statement import registry ===

    /// Has a file with this fingerprint already been reconciled?
    async fn statement_file_seen(&self, fingerprint: &str) -> Result<bool>;

    async fn record_statement_import(&self, record: &StatementImportRecord) -> Result<()>;
}
