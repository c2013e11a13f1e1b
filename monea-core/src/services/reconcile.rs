//! Reconciliation engine - statement import against the existing ledger
//!
//! Statement data is ground truth: SMS-derived running balances can drift,
//! a bank statement cannot. After matching candidates against existing
//! transactions, the statement's closing balance overwrites the account's
//! cached balance unconditionally.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Error, ImportResult, Result, StatementImportRecord, StatementResult, Transaction,
};
use crate::ports::LedgerStore;
use crate::services::ingest::DedupWindow;

use super::AccountLocks;

pub struct ReconcileService {
    store: Arc<dyn LedgerStore>,
    locks: Arc<AccountLocks>,
}

impl ReconcileService {
    pub(crate) fn new(store: Arc<dyn LedgerStore>, locks: Arc<AccountLocks>) -> Self {
        Self { store, locks }
    }

    /// Reconcile one decoded statement into the given account.
    ///
    /// All-or-nothing: the statement's new transactions are committed as
    /// one atomic batch. Duplicate detection happens before the commit
    /// decision, so a statement of pure duplicates is a zero-imported
    /// success, not an error.
    pub async fn reconcile(
        &self,
        account_id: Uuid,
        statement: &StatementResult,
    ) -> Result<ImportResult> {
        if self
            .store
            .statement_file_seen(&statement.file_fingerprint)
            .await?
        {
            return Err(Error::StatementAlreadyImported(statement.file_name.clone()));
        }

        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or(Error::AccountNotFound(account_id))?;

        let lock = self.locks.for_account(account_id);
        let _guard = lock.lock().await;

        let mut result = ImportResult::default();
        for failure in &statement.row_failures {
            result.transactions.failed += 1;
            result.push_error(format!(
                "row could not be decoded ({}): {}",
                crate::domain::result::describe_failure(failure.failure_reason),
                failure.raw_payload
            ));
        }

        // Same dedup rule as bulk ingestion: reference exact, else same
        // calendar day + amount + direction.
        let mut new_transactions = Vec::new();
        for candidate in &statement.candidates {
            if let Some(reference) = candidate.reference.as_deref() {
                if self
                    .store
                    .find_by_reference(account_id, reference)
                    .await?
                    .is_some()
                {
                    result.transactions.skipped += 1;
                    continue;
                }
            }

            let (start, end) = DedupWindow::CalendarDay.bounds(candidate.occurred_at);
            let matches = self
                .store
                .find_by_amount_date_window(
                    account_id,
                    candidate.amount,
                    candidate.direction,
                    start,
                    end,
                )
                .await?;

            if matches.is_empty() {
                new_transactions.push(Transaction::from_candidate(account_id, candidate));
            } else {
                result.transactions.skipped += 1;
            }
        }

        self.store.create_transactions(&new_transactions).await?;
        result.transactions.imported = new_transactions.len() as i64;

        let discrepancy = statement.statement_balance - account.balance;
        if discrepancy != 0 {
            warn!(
                account = %account_id,
                discrepancy,
                "cached balance diverged from statement; statement wins"
            );
        }
        self.store
            .update_account_balance(account_id, statement.statement_balance)
            .await?;
        self.store
            .touch_account_synced(account_id, Utc::now())
            .await?;

        self.store
            .record_statement_import(&StatementImportRecord {
                id: Uuid::new_v4(),
                account_id,
                file_name: statement.file_name.clone(),
                file_fingerprint: statement.file_fingerprint.clone(),
                bank_code: statement.bank_code,
                period_start: statement.period_start,
                period_end: statement.period_end,
                transactions_imported: result.transactions.imported,
                imported_at: Utc::now(),
            })
            .await?;

        info!(
            account = %account_id,
            imported = result.transactions.imported,
            skipped = result.transactions.skipped,
            failed = result.transactions.failed,
            "statement reconciled"
        );

        Ok(result)
    }
}
