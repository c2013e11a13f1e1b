//! Decoded statement output and the import registry record

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountType;
use super::bank::BankCode;
use super::candidate::{FailedExtraction, TransactionCandidate};

/// Declared kind of an uploaded statement file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementFileKind {
    Xlsx,
    Csv,
    Pdf,
}

impl StatementFileKind {
    /// Infer the kind from a file name extension
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "xlsx" | "xls" => Some(StatementFileKind::Xlsx),
            "csv" => Some(StatementFileKind::Csv),
            "pdf" => Some(StatementFileKind::Pdf),
            _ => None,
        }
    }
}

/// Everything a decoder could pull out of one statement file.
///
/// `statement_balance` is authoritative: reconciliation overwrites the
/// account's cached balance with it. Row-level failures ride along in
/// `row_failures` without aborting the decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementResult {
    pub bank_code: Option<BankCode>,
    pub account_number: String,
    pub account_type: AccountType,
    pub holder_name: Option<String>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub opening_balance: Option<i64>,
    pub statement_balance: i64,
    pub candidates: Vec<TransactionCandidate>,
    pub row_failures: Vec<FailedExtraction>,
    pub file_name: String,
    /// sha256 of the raw file bytes, hex-encoded
    pub file_fingerprint: String,
}

/// Registry entry for a reconciled statement file; keyed by fingerprint so
/// re-uploading the same file is rejected instead of re-imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementImportRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub file_name: String,
    pub file_fingerprint: String,
    pub bank_code: Option<BankCode>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub transactions_imported: i64,
    pub imported_at: DateTime<Utc>,
}
