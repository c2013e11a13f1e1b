//! Ingestion pipeline - dedup and commit of transaction candidates
//!
//! Both entry points (realtime push, bulk historical scan) funnel through
//! the same dedup check and the same commit path, so one rule decides what
//! counts as a duplicate everywhere.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    Account, AccountType, CandidateSource, Error, Result, Transaction, TransactionCandidate,
    UNKNOWN_ACCOUNT_NUMBER,
};
use crate::parser;
use crate::ports::{HistoricalQuery, LedgerStore, SmsCapability};

use super::AccountLocks;

/// Messages per chunk; cancellation is honored between chunks
const CHUNK_SIZE: usize = 50;

/// Upper bound on how much of the inbox one bulk pass scans
const SCAN_LIMIT: usize = 5000;

/// Tolerance for matching a realtime event against an existing record
const REALTIME_WINDOW_MINUTES: i64 = 2;

/// How wide the reference-less dedup window is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupWindow {
    /// Same timestamp give or take two minutes (realtime events)
    Realtime,
    /// Same calendar day (bulk scans, statements, reprocessing)
    CalendarDay,
}

impl DedupWindow {
    pub(crate) fn bounds(&self, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            DedupWindow::Realtime => (
                at - Duration::minutes(REALTIME_WINDOW_MINUTES),
                at + Duration::minutes(REALTIME_WINDOW_MINUTES),
            ),
            DedupWindow::CalendarDay => {
                let day = at.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
                (day, day + Duration::days(1))
            }
        }
    }
}

/// What happened to one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Created {
        transaction_id: Uuid,
        account_id: Uuid,
    },
    /// An equivalent transaction already exists; nothing was written
    Duplicate,
}

/// Result of one bulk pass over the historical inbox
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkImportResult {
    /// Bank-attributable messages handled in this pass
    pub processed: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub failed: usize,
    /// More bank messages remain beyond this pass's limit
    pub can_import_more: bool,
    pub errors: Vec<String>,
}

/// Scan cursor between capped bulk batches
#[derive(Debug, Default)]
struct BulkCursor {
    /// Exclusive upper bound for the next scan
    before: Option<DateTime<Utc>>,
    /// Oldest message the last batch handled, by entry kind
    oldest_imported: Option<DateTime<Utc>>,
    oldest_processed: Option<DateTime<Utc>>,
}

pub struct IngestService {
    store: Arc<dyn LedgerStore>,
    sms: Arc<dyn SmsCapability>,
    locks: Arc<AccountLocks>,
    /// Guards account find-or-create so two paths cannot race one account
    /// into existence twice
    creation: tokio::sync::Mutex<()>,
    /// Held for a whole bulk pass; also serializes bulk vs bulk
    cursor: tokio::sync::Mutex<BulkCursor>,
    cancelled: AtomicBool,
}

impl IngestService {
    pub(crate) fn new(
        store: Arc<dyn LedgerStore>,
        sms: Arc<dyn SmsCapability>,
        locks: Arc<AccountLocks>,
    ) -> Self {
        Self {
            store,
            sms,
            locks,
            creation: tokio::sync::Mutex::new(()),
            cursor: tokio::sync::Mutex::new(BulkCursor::default()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Ingest one realtime candidate
    pub async fn ingest_realtime(&self, candidate: TransactionCandidate) -> Result<IngestOutcome> {
        self.ingest_candidate(candidate, DedupWindow::Realtime).await
    }

    /// Ingest one candidate under the given dedup window
    pub async fn ingest_candidate(
        &self,
        candidate: TransactionCandidate,
        window: DedupWindow,
    ) -> Result<IngestOutcome> {
        let account_id = self.resolve_account(&candidate).await?;

        let lock = self.locks.for_account(account_id);
        let _guard = lock.lock().await;

        self.commit_candidate(account_id, candidate, window).await
    }

    /// Dedup check and commit. Caller must hold the account's lock.
    async fn commit_candidate(
        &self,
        account_id: Uuid,
        candidate: TransactionCandidate,
        window: DedupWindow,
    ) -> Result<IngestOutcome> {
        if let Some(reference) = candidate.reference.as_deref() {
            if self
                .store
                .find_by_reference(account_id, reference)
                .await?
                .is_some()
            {
                debug!(account = %account_id, reference, "duplicate by reference");
                return Ok(IngestOutcome::Duplicate);
            }
        }

        let (start, end) = window.bounds(candidate.occurred_at);
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
        if !matches.is_empty() {
            debug!(account = %account_id, amount = candidate.amount, "duplicate by amount/date window");
            return Ok(IngestOutcome::Duplicate);
        }

        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or(Error::AccountNotFound(account_id))?;

        let tx = Transaction::from_candidate(account_id, &candidate);
        self.store.create_transaction(&tx).await?;

        // Prefer the balance the bank reported; fall back to rolling the
        // signed amount into the cached value. A later statement
        // reconciliation supersedes either.
        let new_balance = candidate
            .running_balance
            .unwrap_or(account.balance + tx.signed_amount());
        self.store
            .update_account_balance(account_id, new_balance)
            .await?;
        self.store
            .touch_account_synced(account_id, Utc::now())
            .await?;

        debug!(account = %account_id, source = ?candidate.source, "transaction committed");

        Ok(IngestOutcome::Created {
            transaction_id: tx.id,
            account_id,
        })
    }

    /// Find the account a candidate belongs to, creating it on first sight
    async fn resolve_account(&self, candidate: &TransactionCandidate) -> Result<Uuid> {
        let number = candidate
            .account_last4
            .clone()
            .unwrap_or_else(|| UNKNOWN_ACCOUNT_NUMBER.to_string());

        let _guard = self.creation.lock().await;

        let existing = self.store.find_accounts_by_bank(candidate.bank_code).await?;
        if let Some(account) = existing.into_iter().find(|a| a.account_number == number) {
            return Ok(account.id);
        }

        let account = Account::new(
            candidate.bank_code,
            number,
            AccountType::default_for(candidate.bank_code),
        );
        self.store.create_account(&account).await?;
        info!(bank = ?candidate.bank_code, "created account from message");
        Ok(account.id)
    }

    /// Scan the historical inbox and ingest up to `limit` bank messages.
    ///
    /// The scan walks newest-first from the session cursor. Non-bank
    /// messages are skipped silently; bank messages count as processed
    /// whether they import, dedupe or fail. Cancellation is cooperative
    /// between chunks: chunks already committed stay committed.
    pub async fn ingest_bulk(&self, limit: usize) -> Result<BulkImportResult> {
        self.cancelled.store(false, Ordering::SeqCst);
        let mut cursor = self.cursor.lock().await;

        let messages = self
            .sms
            .fetch_historical(HistoricalQuery {
                before: cursor.before,
                limit: SCAN_LIMIT,
            })
            .await?;

        let bank_messages: Vec<_> = messages
            .into_iter()
            .filter(|m| parser::classifier::classify(&m.sender, &m.body).is_some())
            .collect();

        let mut result = BulkImportResult {
            can_import_more: bank_messages.len() > limit,
            ..Default::default()
        };

        // Newest `limit` messages this pass; commit oldest-first inside
        // the batch to preserve ledger ordering.
        let mut batch: Vec<_> = bank_messages.into_iter().take(limit).collect();
        batch.sort_by_key(|m| m.received_at);

        cursor.oldest_imported = None;
        cursor.oldest_processed = batch.first().map(|m| m.received_at);

        for chunk in batch.chunks(CHUNK_SIZE) {
            if self.cancelled.load(Ordering::SeqCst) {
                info!(processed = result.processed, "bulk import cancelled");
                break;
            }

            for message in chunk {
                result.processed += 1;

                match parser::classify_and_extract(
                    &message.sender,
                    &message.body,
                    message.received_at,
                    CandidateSource::BulkSms,
                ) {
                    Ok(candidate) => {
                        match self
                            .ingest_candidate(candidate, DedupWindow::CalendarDay)
                            .await?
                        {
                            IngestOutcome::Created { .. } => {
                                result.imported += 1;
                                let oldest = cursor.oldest_imported;
                                cursor.oldest_imported = Some(match oldest {
                                    Some(prev) => prev.min(message.received_at),
                                    None => message.received_at,
                                });
                            }
                            IngestOutcome::Duplicate => result.duplicates += 1,
                        }
                    }
                    Err(failed) => {
                        result.failed += 1;
                        result
                            .errors
                            .push(crate::domain::result::describe_failure(failed.failure_reason).to_string());
                        self.store.save_failed_extraction(&failed).await?;
                    }
                }
            }
        }

        info!(
            imported = result.imported,
            duplicates = result.duplicates,
            failed = result.failed,
            more = result.can_import_more,
            "bulk import pass finished"
        );

        Ok(result)
    }

    /// Move the scan cursor strictly past the previous batch so the next
    /// `ingest_bulk` continues with older messages.
    ///
    /// The boundary is the oldest successfully imported message's
    /// timestamp, exclusive; when a batch imported nothing (all
    /// duplicates), the oldest processed message bounds the next scan so
    /// the pass still makes progress.
    pub async fn prepare_for_more(&self) -> Option<DateTime<Utc>> {
        let mut cursor = self.cursor.lock().await;
        if let Some(boundary) = cursor.oldest_imported.or(cursor.oldest_processed) {
            cursor.before = Some(boundary);
        }
        cursor.oldest_imported = None;
        cursor.oldest_processed = None;
        cursor.before
    }

    /// Request cancellation of an in-flight bulk pass
    pub fn cancel_bulk(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// How many bank messages a full-inbox scan would consider
    pub async fn estimated_count(&self) -> Result<usize> {
        let messages = self
            .sms
            .fetch_historical(HistoricalQuery {
                before: None,
                limit: SCAN_LIMIT,
            })
            .await?;
        Ok(messages
            .iter()
            .filter(|m| parser::classifier::classify(&m.sender, &m.body).is_some())
            .count())
    }
}
