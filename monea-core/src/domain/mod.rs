//! Core domain entities and value types

pub mod account;
pub mod backup;
pub mod bank;
pub mod candidate;
pub mod category;
pub mod result;
pub mod statement;
pub mod sync_state;
pub mod transaction;

pub use account::{Account, AccountType, UNKNOWN_ACCOUNT_NUMBER};
pub use backup::{BackupData, BackupMetadata, ImportStrategy, BACKUP_VERSION};
pub use bank::BankCode;
pub use candidate::{CandidateSource, FailedExtraction, FailureReason, TransactionCandidate};
pub use category::Category;
pub use result::{DecodeError, EntityCounts, Error, ImportResult, Result};
pub use statement::{StatementFileKind, StatementImportRecord, StatementResult};
pub use sync_state::{PermissionState, SyncState};
pub use transaction::{Transaction, TransactionType};
