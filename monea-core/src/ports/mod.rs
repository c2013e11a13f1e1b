//! Port definitions for external collaborators

pub mod sms;
pub mod store;

pub use sms::{HistoricalQuery, PermissionStatus, RawSms, SmsCapability};
pub use store::LedgerStore;
