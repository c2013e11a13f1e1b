//! Transaction candidates and failed extractions
//!
//! A candidate is an unpersisted, parsed transaction awaiting dedup and
//! commit. Anything that cannot be turned into a candidate becomes a
//! `FailedExtraction` and is queued durably for later reprocessing; it is
//! never silently discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bank::BankCode;
use super::transaction::TransactionType;

/// Which entry point observed the underlying bank event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    RealtimeSms,
    BulkSms,
    StatementPdf,
    StatementExcel,
    BackupImport,
}

/// A parsed transaction not yet checked against the ledger.
///
/// Invariants: `amount > 0`, `direction` always resolved. Input that cannot
/// satisfy these is a `FailedExtraction`, not a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCandidate {
    pub source: CandidateSource,
    pub bank_code: BankCode,
    pub direction: TransactionType,
    /// Whole Colombian pesos
    pub amount: i64,
    pub occurred_at: DateTime<Utc>,
    /// Merchant or counterparty, already normalized
    pub counterparty: Option<String>,
    pub description: Option<String>,
    /// Bank-provided transaction id when the message carries one
    pub reference: Option<String>,
    /// Last four digits of the account the bank addressed
    pub account_last4: Option<String>,
    /// Running balance reported alongside the movement
    pub running_balance: Option<i64>,
    /// Original text or row, retained for audit and reprocessing
    pub raw_payload: String,
}

/// Why extraction failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    UnrecognizedBank,
    UnrecognizedTemplate,
    UnparseableAmount,
    UnparseableDate,
}

/// A raw input that produced no candidate.
///
/// Created by the classifier/extractors on failure; mutated only by the
/// sync state machine's reprocess operation, which either promotes it to an
/// ingested transaction and deletes it, or bumps `retry_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedExtraction {
    pub id: Uuid,
    pub sender: String,
    pub raw_payload: String,
    pub source: CandidateSource,
    pub failure_reason: FailureReason,
    pub first_seen_at: DateTime<Utc>,
    pub retry_count: u32,
}

impl FailedExtraction {
    pub fn new(
        sender: impl Into<String>,
        raw_payload: impl Into<String>,
        source: CandidateSource,
        failure_reason: FailureReason,
        first_seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            raw_payload: raw_payload.into(),
            source,
            failure_reason,
            first_seen_at,
            retry_count: 0,
        }
    }
}
