//! Backup service - portable JSON export and merge import
//!
//! Imports run in a fixed order (categories, accounts, transactions)
//! because transactions reference both, remapping every foreign id to a
//! local one. Merge semantics: entities that already exist locally are
//! skipped, never overwritten, but their ids still enter the remap table
//! so dependent records attach correctly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::domain::backup::{
    AccountExport, BackupApp, BackupMetadata, BackupPayload, CategoryExport, TransactionExport,
    APP_NAME,
};
use crate::domain::{
    Account, BackupData, CandidateSource, Category, Error, ImportResult, ImportStrategy, Result,
    Transaction, BACKUP_VERSION,
};
use crate::ports::LedgerStore;

pub struct BackupService {
    store: Arc<dyn LedgerStore>,
}

impl BackupService {
    pub(crate) fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Export the full local dataset as a portable document.
    /// System categories stay home; every install has its own.
    pub async fn export_backup(&self) -> Result<BackupData> {
        let accounts = self.store.get_accounts().await?;
        let categories = self.store.get_categories().await?;

        let mut transactions = Vec::new();
        for account in &accounts {
            for tx in self.store.transactions_for_account(account.id).await? {
                transactions.push(transaction_to_export(&tx));
            }
        }

        Ok(BackupData {
            metadata: BackupMetadata {
                version: BACKUP_VERSION,
                exported_at: Utc::now().to_rfc3339(),
                app: BackupApp {
                    name: APP_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
            data: BackupPayload {
                accounts: accounts.iter().map(account_to_export).collect(),
                transactions,
                categories: categories
                    .iter()
                    .filter(|c| !c.is_system)
                    .map(category_to_export)
                    .collect(),
            },
        })
    }

    /// Merge a backup produced by another device into the local store.
    ///
    /// Fails fast only on an unsupported (newer) schema version; every
    /// individual entity failure appends to the error list and processing
    /// continues. `success` is true only with an empty error list.
    pub async fn import_backup(
        &self,
        backup: &BackupData,
        _strategy: ImportStrategy,
    ) -> Result<ImportResult> {
        if backup.metadata.version > BACKUP_VERSION {
            return Err(Error::UnsupportedBackupVersion {
                found: backup.metadata.version,
                supported: BACKUP_VERSION,
            });
        }

        let mut result = ImportResult::default();
        let mut category_map: HashMap<String, Uuid> = HashMap::new();
        let mut account_map: HashMap<String, Uuid> = HashMap::new();

        for category in &backup.data.categories {
            match self.import_category(category, &mut category_map).await {
                Ok(imported) => {
                    if imported {
                        result.categories.imported += 1;
                    } else {
                        result.categories.skipped += 1;
                    }
                }
                Err(err) => {
                    result.categories.failed += 1;
                    result.push_error(format!(
                        "failed to import category \"{}\": {}",
                        category.name, err
                    ));
                }
            }
        }

        for account in &backup.data.accounts {
            match self.import_account(account, &mut account_map).await {
                Ok(imported) => {
                    if imported {
                        result.accounts.imported += 1;
                    } else {
                        result.accounts.skipped += 1;
                    }
                }
                Err(err) => {
                    result.accounts.failed += 1;
                    result.push_error(format!(
                        "failed to import account \"{}\": {}",
                        account.bank_name, err
                    ));
                }
            }
        }

        for transaction in &backup.data.transactions {
            match self
                .import_transaction(transaction, &account_map, &category_map)
                .await
            {
                Ok(TransactionImport::Created) => result.transactions.imported += 1,
                Ok(TransactionImport::Skipped) => result.transactions.skipped += 1,
                Err(err) => {
                    result.transactions.failed += 1;
                    result.push_error(format!("failed to import transaction: {}", err));
                }
            }
        }

        info!(
            accounts = result.accounts.imported,
            transactions = result.transactions.imported,
            categories = result.categories.imported,
            errors = result.errors.len(),
            "backup merge finished"
        );

        Ok(result)
    }

    /// Returns whether the category was created (vs skipped)
    async fn import_category(
        &self,
        category: &CategoryExport,
        category_map: &mut HashMap<String, Uuid>,
    ) -> Result<bool> {
        if category.is_system {
            return Ok(false);
        }

        if let Some(existing) = self.store.find_category_by_name(&category.name).await? {
            category_map.insert(category.id.clone(), existing.id);
            return Ok(false);
        }

        let local = Category::new(
            &category.name,
            &category.icon,
            &category.color,
            category.is_income,
        );
        self.store.create_category(&local).await?;
        category_map.insert(category.id.clone(), local.id);
        Ok(true)
    }

    /// Returns whether the account was created (vs skipped). A skipped
    /// account is still mapped so its transactions attach to the local
    /// account with the same number.
    async fn import_account(
        &self,
        account: &AccountExport,
        account_map: &mut HashMap<String, Uuid>,
    ) -> Result<bool> {
        if let Some(existing) = self
            .store
            .find_account_by_number(&account.account_number)
            .await?
        {
            account_map.insert(account.id.clone(), existing.id);
            return Ok(false);
        }

        let local = Account {
            id: Uuid::new_v4(),
            bank_code: account.bank_code,
            bank_name: account.bank_name.clone(),
            account_number: account.account_number.clone(),
            account_type: account.account_type,
            balance: account.balance,
            is_active: account.is_active,
            last_synced_at: account.last_synced_at.and_then(DateTime::from_timestamp_millis),
            created_at: Utc::now(),
        };
        self.store.create_account(&local).await?;
        account_map.insert(account.id.clone(), local.id);
        Ok(true)
    }

    async fn import_transaction(
        &self,
        transaction: &TransactionExport,
        account_map: &HashMap<String, Uuid>,
        category_map: &HashMap<String, Uuid>,
    ) -> Result<TransactionImport> {
        // Account missing from the map means it failed to import; its
        // transactions are skipped, not errors.
        let Some(&account_id) = account_map.get(&transaction.account_id) else {
            return Ok(TransactionImport::Skipped);
        };

        if let Some(reference) = transaction.reference.as_deref() {
            if self
                .store
                .find_by_reference(account_id, reference)
                .await?
                .is_some()
            {
                return Ok(TransactionImport::Skipped);
            }
        }

        let transaction_date = DateTime::from_timestamp_millis(transaction.transaction_date)
            .ok_or_else(|| Error::InvalidBackup("transaction date out of range".to_string()))?;

        // A missing category mapping drops the reference; it never sinks
        // the transaction.
        let category_id = transaction
            .category_id
            .as_ref()
            .and_then(|id| category_map.get(id))
            .copied();

        let local = Transaction {
            id: Uuid::new_v4(),
            account_id,
            category_id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            transaction_date,
            merchant: transaction.merchant.clone(),
            description: transaction.description.clone(),
            reference: transaction.reference.clone(),
            balance_after: transaction.balance_after,
            provenance: CandidateSource::BackupImport,
            created_at: Utc::now(),
        };
        self.store.create_transaction(&local).await?;
        Ok(TransactionImport::Created)
    }
}

enum TransactionImport {
    Created,
    Skipped,
}

fn account_to_export(account: &Account) -> AccountExport {
    AccountExport {
        id: account.id.to_string(),
        bank_code: account.bank_code,
        bank_name: account.bank_name.clone(),
        account_number: account.account_number.clone(),
        account_type: account.account_type,
        balance: account.balance,
        is_active: account.is_active,
        last_synced_at: account.last_synced_at.map(|t| t.timestamp_millis()),
        created_at: account.created_at.timestamp_millis(),
    }
}

fn transaction_to_export(tx: &Transaction) -> TransactionExport {
    TransactionExport {
        id: tx.id.to_string(),
        account_id: tx.account_id.to_string(),
        category_id: tx.category_id.map(|id| id.to_string()),
        transaction_type: tx.transaction_type,
        amount: tx.amount,
        balance_after: tx.balance_after,
        merchant: tx.merchant.clone(),
        description: tx.description.clone(),
        reference: tx.reference.clone(),
        transaction_date: tx.transaction_date.timestamp_millis(),
        created_at: tx.created_at.timestamp_millis(),
    }
}

fn category_to_export(category: &Category) -> CategoryExport {
    CategoryExport {
        id: category.id.to_string(),
        name: category.name.clone(),
        icon: category.icon.clone(),
        color: category.color.clone(),
        is_system: category.is_system,
        is_income: category.is_income,
        created_at: category.created_at.timestamp_millis(),
    }
}
