//! Result and error types for the engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::candidate::FailureReason;
use super::sync_state::PermissionState;

/// Statement decode failures.
///
/// `IncorrectPassword` is its own variant so callers can re-prompt for a
/// password instead of showing a terminal error.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("document is encrypted and the password is missing or incorrect")]
    IncorrectPassword,

    #[error("malformed statement file: {0}")]
    MalformedFile(String),

    #[error("unsupported statement file kind: {0}")]
    UnsupportedFileKind(String),
}

/// Engine error type
///
/// Extraction failures never appear here: an SMS that cannot be parsed is
/// returned as a `FailedExtraction` value, not an error. Only statement
/// decoding, backup validation and collaborator (store/platform) failures
/// are hard errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("backup version {found} is newer than supported version {supported}")]
    UnsupportedBackupVersion { found: u32, supported: u32 },

    #[error("invalid backup document: {0}")]
    InvalidBackup(String),

    #[error("account not found: {0}")]
    AccountNotFound(uuid::Uuid),

    #[error("statement file already imported: {0}")]
    StatementAlreadyImported(String),

    #[error("realtime listening requires granted SMS permission (current: {0:?})")]
    ListeningUnavailable(PermissionState),

    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("sms capability error: {0}")]
    Sms(#[source] anyhow::Error),
}

impl Error {
    /// Wrap an opaque store-layer failure
    pub fn store(err: impl Into<anyhow::Error>) -> Self {
        Self::Store(err.into())
    }

    /// Wrap an opaque platform SMS failure
    pub fn sms(err: impl Into<anyhow::Error>) -> Self {
        Self::Sms(err.into())
    }
}

/// Engine result type
pub type Result<T> = std::result::Result<T, Error>;

/// Per-entity import counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub imported: i64,
    pub skipped: i64,
    pub failed: i64,
}

/// Result of a batch operation (bulk import, statement reconciliation,
/// backup import, reprocessing).
///
/// Batch operations never fail wholesale on a single bad record; individual
/// failures append to `errors` and processing continues.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub accounts: EntityCounts,
    pub transactions: EntityCounts,
    pub categories: EntityCounts,
    pub errors: Vec<String>,
}

/// Cap on retained error strings; past this, further errors are counted
/// but their messages are dropped.
const MAX_ERRORS: usize = 50;

impl ImportResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(message.into());
        } else if self.errors.len() == MAX_ERRORS {
            self.errors
                .push("further errors truncated".to_string());
        }
    }
}

/// Why an extraction attempt produced no candidate, as a user-facing string
pub fn describe_failure(reason: FailureReason) -> &'static str {
    match reason {
        FailureReason::UnrecognizedBank => "sender is not a recognized bank",
        FailureReason::UnrecognizedTemplate => "no message template matched",
        FailureReason::UnparseableAmount => "amount token missing or unparseable",
        FailureReason::UnparseableDate => "embedded date is unparseable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_result_success() {
        let mut result = ImportResult::default();
        assert!(result.success());

        result.push_error("bad record");
        assert!(!result.success());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_error_list_is_bounded() {
        let mut result = ImportResult::default();
        for i in 0..200 {
            result.push_error(format!("error {}", i));
        }
        assert_eq!(result.errors.len(), MAX_ERRORS + 1);
        assert_eq!(result.errors.last().unwrap(), "further errors truncated");
    }
}
