//! Business logic orchestration

pub mod backup;
pub mod ingest;
pub mod reconcile;
pub mod sync;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

pub use backup::BackupService;
pub use ingest::{BulkImportResult, IngestOutcome, IngestService};
pub use reconcile::ReconcileService;
pub use sync::SyncService;

/// Per-account commit serialization.
///
/// Parsing is pure and runs freely in parallel; committing to the store is
/// serialized per account so balance updates and dedup checks never race.
/// A realtime event landing while a bulk chunk holds its account's lock
/// simply queues behind it and applies after the chunk commits.
#[derive(Default)]
pub(crate) struct AccountLocks {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl AccountLocks {
    pub(crate) fn for_account(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap();
        map.entry(id).or_default().clone()
    }
}
