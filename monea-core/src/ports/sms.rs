//! Platform SMS capability port
//!
//! The OS delivers raw `(sender, body, timestamp)` tuples. Realtime
//! delivery is push-based: the platform writes into the bounded channel the
//! sync service hands out when listening starts. Historical scans are
//! pull-based through `fetch_historical`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// One raw message as delivered by the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSms {
    pub sender: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

/// Bounded historical inbox query. Results come back newest-first;
/// `before` is exclusive so a scan can resume past an earlier batch.
#[derive(Debug, Clone, Copy)]
pub struct HistoricalQuery {
    pub before: Option<DateTime<Utc>>,
    pub limit: usize,
}

/// What the platform currently allows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionStatus {
    /// May we read the existing inbox (bulk import)?
    pub can_read_inbox: bool,
    /// May we receive new-message broadcasts (realtime)?
    pub can_receive_push: bool,
}

impl PermissionStatus {
    pub fn fully_granted(&self) -> bool {
        self.can_read_inbox && self.can_receive_push
    }

    pub fn partially_granted(&self) -> bool {
        self.can_read_inbox || self.can_receive_push
    }
}

#[async_trait]
pub trait SmsCapability: Send + Sync {
    async fn check_permissions(&self) -> Result<PermissionStatus>;

    /// Show the platform permission prompt; returns whether the user
    /// granted anything new
    async fn request_permissions(&self) -> Result<bool>;

    /// Query the inbox, newest first
    async fn fetch_historical(&self, query: HistoricalQuery) -> Result<Vec<RawSms>>;
}
