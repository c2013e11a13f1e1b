//! Sync state machine - permission lifecycle, realtime listening, and the
//! failed-extraction queue
//!
//! Owns the only mutable sync state in the engine. The permission value
//! lives here; the unprocessed count is always recomputed from the
//! persisted failed-extraction set, so a process restart reconstructs the
//! same picture.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::{Error, ImportResult, PermissionState, Result, SyncState};
use crate::parser;
use crate::ports::{LedgerStore, RawSms, SmsCapability};
use crate::services::ingest::{DedupWindow, IngestOutcome, IngestService};

/// Bound on queued realtime messages awaiting the consumer
const REALTIME_QUEUE_CAPACITY: usize = 64;

/// Permission prompt attempts before concluding the user said no
const PERMISSION_ATTEMPTS: usize = 2;
const PERMISSION_RETRY_DELAY: Duration = Duration::from_millis(300);

struct ListenerHandle {
    sender: mpsc::Sender<RawSms>,
    task: JoinHandle<()>,
}

pub struct SyncService {
    store: Arc<dyn LedgerStore>,
    sms: Arc<dyn SmsCapability>,
    ingest: Arc<IngestService>,
    permission: Mutex<PermissionState>,
    listener: tokio::sync::Mutex<Option<ListenerHandle>>,
}

impl SyncService {
    pub(crate) fn new(
        store: Arc<dyn LedgerStore>,
        sms: Arc<dyn SmsCapability>,
        ingest: Arc<IngestService>,
    ) -> Self {
        Self {
            store,
            sms,
            ingest,
            permission: Mutex::new(PermissionState::Unknown),
            listener: tokio::sync::Mutex::new(None),
        }
    }

    fn set_permission(&self, state: PermissionState) {
        *self.permission.lock().unwrap() = state;
    }

    pub fn permission(&self) -> PermissionState {
        *self.permission.lock().unwrap()
    }

    /// Probe the platform without prompting
    pub async fn check_permissions(&self) -> Result<PermissionState> {
        self.set_permission(PermissionState::Checking);

        let status = self.sms.check_permissions().await?;
        let state = if status.fully_granted() {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };

        self.set_permission(state);
        Ok(state)
    }

    /// Prompt the user, with a bounded retry. Full grant ends `Granted`;
    /// a partial grant is `Denied` (retryable); nothing at all after the
    /// attempts means the platform suppressed the prompt: `Blocked`.
    pub async fn request_permissions(&self) -> Result<PermissionState> {
        self.set_permission(PermissionState::Checking);

        for attempt in 0..PERMISSION_ATTEMPTS {
            let status = self.sms.check_permissions().await?;
            if status.fully_granted() {
                self.set_permission(PermissionState::Granted);
                return Ok(PermissionState::Granted);
            }

            self.sms.request_permissions().await?;

            if attempt + 1 < PERMISSION_ATTEMPTS {
                tokio::time::sleep(PERMISSION_RETRY_DELAY).await;
            }
        }

        let status = self.sms.check_permissions().await?;
        let state = if status.fully_granted() {
            PermissionState::Granted
        } else if status.partially_granted() {
            PermissionState::Denied
        } else {
            PermissionState::Blocked
        };

        self.set_permission(state);
        Ok(state)
    }

    /// Re-check after the user visited system settings; the only way out
    /// of `Blocked`.
    pub async fn recheck_after_settings(&self) -> Result<PermissionState> {
        self.check_permissions().await
    }

    /// Start the realtime path: returns the bounded channel the platform
    /// pushes raw messages into. A single consumer drains it through the
    /// same classify-extract-ingest pipeline bulk import uses.
    pub async fn start_listening(&self) -> Result<mpsc::Sender<RawSms>> {
        let state = self.permission();
        if state != PermissionState::Granted {
            return Err(Error::ListeningUnavailable(state));
        }

        let mut listener = self.listener.lock().await;
        if let Some(handle) = listener.as_ref() {
            return Ok(handle.sender.clone());
        }

        let (sender, mut receiver) = mpsc::channel::<RawSms>(REALTIME_QUEUE_CAPACITY);
        let store = Arc::clone(&self.store);
        let ingest = Arc::clone(&self.ingest);

        let task = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                match parser::classify_and_extract(
                    &message.sender,
                    &message.body,
                    message.received_at,
                    crate::domain::CandidateSource::RealtimeSms,
                ) {
                    Ok(candidate) => match ingest.ingest_realtime(candidate).await {
                        Ok(IngestOutcome::Created { account_id, .. }) => {
                            info!(account = %account_id, "realtime transaction ingested");
                        }
                        Ok(IngestOutcome::Duplicate) => {}
                        Err(err) => warn!(error = %err, "realtime ingest failed"),
                    },
                    Err(failed) => {
                        if let Err(err) = store.save_failed_extraction(&failed).await {
                            warn!(error = %err, "could not queue failed extraction");
                        }
                    }
                }
            }
        });

        info!("realtime listening started");
        let sender_out = sender.clone();
        *listener = Some(ListenerHandle { sender, task });
        Ok(sender_out)
    }

    /// Stop the realtime path, draining whatever is already queued
    pub async fn stop_listening(&self) {
        let handle = self.listener.lock().await.take();
        if let Some(ListenerHandle { sender, task }) = handle {
            drop(sender);
            let _ = task.await;
            info!("realtime listening stopped");
        }
    }

    pub async fn is_listening(&self) -> bool {
        self.listener.lock().await.is_some()
    }

    /// Current machine snapshot; the unprocessed count comes from the
    /// durable queue, not memory.
    pub async fn sync_state(&self) -> Result<SyncState> {
        let unprocessed_count = self.store.list_failed_extractions().await?.len();
        Ok(SyncState {
            permission: self.permission(),
            is_listening: self.is_listening().await,
            unprocessed_count,
        })
    }

    /// Re-run extraction over every queued raw payload.
    ///
    /// Successes (including rediscovered duplicates) leave the queue;
    /// repeat failures stay visible with a bumped retry count. There is no
    /// retry cap: a payload remains until it reprocesses or the user
    /// clears the source.
    pub async fn reprocess_failed(&self) -> Result<ImportResult> {
        let queued = self.store.list_failed_extractions().await?;
        let mut result = ImportResult::default();

        for failed in queued {
            match parser::classify_and_extract(
                &failed.sender,
                &failed.raw_payload,
                failed.first_seen_at,
                failed.source,
            ) {
                Ok(candidate) => {
                    match self
                        .ingest
                        .ingest_candidate(candidate, DedupWindow::CalendarDay)
                        .await?
                    {
                        IngestOutcome::Created { .. } => result.transactions.imported += 1,
                        IngestOutcome::Duplicate => result.transactions.skipped += 1,
                    }
                    self.store.delete_failed_extraction(failed.id).await?;
                }
                Err(again) => {
                    result.transactions.failed += 1;
                    result.push_error(format!(
                        "still unprocessable ({}): {}",
                        crate::domain::result::describe_failure(again.failure_reason),
                        failed.sender
                    ));
                    self.store.bump_failed_retry(failed.id).await?;
                }
            }
        }

        info!(
            promoted = result.transactions.imported,
            skipped = result.transactions.skipped,
            remaining = result.transactions.failed,
            "reprocess pass finished"
        );

        Ok(result)
    }
}
