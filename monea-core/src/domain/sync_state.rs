//! Sync state: SMS permission lifecycle and listening status

use serde::{Deserialize, Serialize};

/// SMS permission lifecycle.
///
/// `Unknown -> Checking -> {Granted, Denied, Blocked}`. A denied state can
/// retry back through `Checking`; `Blocked` means the platform will no
/// longer show the prompt and the user must change it in system settings
/// before a re-check can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Unknown,
    Checking,
    Granted,
    Denied,
    Blocked,
}

/// Snapshot of the sync machine, recomputed from persisted state on
/// every read so it survives process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncState {
    pub permission: PermissionState,
    pub is_listening: bool,
    /// Count of queued failed extractions awaiting reprocessing
    pub unprocessed_count: usize,
}
