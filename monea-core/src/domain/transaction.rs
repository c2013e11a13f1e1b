//! Transaction domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::candidate::{CandidateSource, TransactionCandidate};

/// Direction of money movement as the banks report it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    TransferIn,
    TransferOut,
}

impl TransactionType {
    /// Sign applied to the amount when rolling it into an account balance
    pub fn sign(&self) -> i64 {
        match self {
            TransactionType::Income | TransactionType::TransferIn => 1,
            TransactionType::Expense | TransactionType::TransferOut => -1,
        }
    }
}

/// A committed financial transaction belonging to an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    /// Whole Colombian pesos, always positive; direction carries the sign
    pub amount: i64,
    pub transaction_date: DateTime<Utc>,
    pub merchant: Option<String>,
    pub description: Option<String>,
    /// Bank-provided transaction id, unique per account when present
    pub reference: Option<String>,
    /// Running balance the source reported after this movement
    pub balance_after: Option<i64>,
    /// Which ingestion path produced this record
    pub provenance: CandidateSource,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a persistable transaction from a deduplicated candidate
    pub fn from_candidate(account_id: Uuid, candidate: &TransactionCandidate) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            category_id: None,
            transaction_type: candidate.direction,
            amount: candidate.amount,
            transaction_date: candidate.occurred_at,
            merchant: candidate.counterparty.clone(),
            description: candidate.description.clone(),
            reference: candidate.reference.clone(),
            balance_after: candidate.running_balance,
            provenance: candidate.source,
            created_at: Utc::now(),
        }
    }

    /// Amount with the direction's sign applied
    pub fn signed_amount(&self) -> i64 {
        self.transaction_type.sign() * self.amount
    }
}
