//! Monea Core - multi-source transaction ingestion and reconciliation
//!
//! This crate turns heterogeneous, semi-structured inputs (bank SMS text,
//! statement files, portable backups) into one deduplicated,
//! balance-consistent transaction ledger. Hexagonal layout:
//!
//! - **domain**: entities and value types (Account, Transaction,
//!   TransactionCandidate, FailedExtraction, ...)
//! - **ports**: trait definitions for the external collaborators
//!   (persistent store, platform SMS capability)
//! - **parser**: message classifier and per-bank field extractors
//! - **statement**: tabular and document statement decoders
//! - **services**: ingestion, reconciliation, backup merge, sync state
//! - **adapters**: in-memory port implementations

pub mod adapters;
pub mod domain;
pub mod parser;
pub mod ports;
pub mod services;
pub mod statement;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use services::AccountLocks;

// Re-export commonly used types at crate root
pub use domain::{
    Account, AccountType, BackupData, BankCode, CandidateSource, Category, DecodeError,
    EntityCounts, Error, FailedExtraction, FailureReason, ImportResult, ImportStrategy,
    PermissionState, Result, StatementFileKind, StatementResult, SyncState, Transaction,
    TransactionCandidate, TransactionType, BACKUP_VERSION,
};
pub use ports::{HistoricalQuery, PermissionStatus, RawSms, SmsCapability};
pub use ports::LedgerStore;
pub use services::{BulkImportResult, IngestOutcome};

/// Main entry point for the engine
///
/// Owns the collaborator handles and the services. The UI layer talks to
/// this and nothing below it.
pub struct Engine {
    pub store: Arc<dyn LedgerStore>,
    pub sms: Arc<dyn SmsCapability>,
    pub ingest: Arc<services::IngestService>,
    pub reconcile: services::ReconcileService,
    pub backup: services::BackupService,
    pub sync: services::SyncService,
}

impl Engine {
    pub fn new(store: Arc<dyn LedgerStore>, sms: Arc<dyn SmsCapability>) -> Self {
        let locks = Arc::new(AccountLocks::default());

        let ingest = Arc::new(services::IngestService::new(
            Arc::clone(&store),
            Arc::clone(&sms),
            Arc::clone(&locks),
        ));
        let reconcile = services::ReconcileService::new(Arc::clone(&store), Arc::clone(&locks));
        let backup = services::BackupService::new(Arc::clone(&store));
        let sync = services::SyncService::new(
            Arc::clone(&store),
            Arc::clone(&sms),
            Arc::clone(&ingest),
        );

        Self {
            store,
            sms,
            ingest,
            reconcile,
            backup,
            sync,
        }
    }

    /// Classify a raw message and extract a candidate (pure; does not
    /// touch the store)
    pub fn classify_and_extract(
        &self,
        sender: &str,
        body: &str,
        received_at: DateTime<Utc>,
    ) -> std::result::Result<TransactionCandidate, Box<FailedExtraction>> {
        parser::classify_and_extract(sender, body, received_at, CandidateSource::RealtimeSms)
    }

    pub async fn ingest_realtime(&self, candidate: TransactionCandidate) -> Result<IngestOutcome> {
        self.ingest.ingest_realtime(candidate).await
    }

    pub async fn ingest_bulk(&self, limit: usize) -> Result<BulkImportResult> {
        self.ingest.ingest_bulk(limit).await
    }

    pub async fn prepare_for_more(&self) -> Option<DateTime<Utc>> {
        self.ingest.prepare_for_more().await
    }

    /// Decode an uploaded statement file (pure; reconciliation is a
    /// separate step so the caller can confirm the target account first)
    pub fn decode_statement(
        &self,
        data: &[u8],
        file_name: &str,
        kind: StatementFileKind,
        password: Option<&str>,
    ) -> std::result::Result<StatementResult, DecodeError> {
        statement::decode_statement(data, file_name, kind, password)
    }

    pub async fn reconcile_statement(
        &self,
        account_id: Uuid,
        statement: &StatementResult,
    ) -> Result<ImportResult> {
        self.reconcile.reconcile(account_id, statement).await
    }

    pub async fn export_backup(&self) -> Result<BackupData> {
        self.backup.export_backup().await
    }

    pub async fn import_backup(
        &self,
        backup: &BackupData,
        strategy: ImportStrategy,
    ) -> Result<ImportResult> {
        self.backup.import_backup(backup, strategy).await
    }

    pub async fn reprocess_failed(&self) -> Result<ImportResult> {
        self.sync.reprocess_failed().await
    }

    pub async fn sync_state(&self) -> Result<SyncState> {
        self.sync.sync_state().await
    }
}
