//! Account domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bank::BankCode;

/// Placeholder account number when a message carries no last-4 digits
pub const UNKNOWN_ACCOUNT_NUMBER: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Savings,
    Checking,
    Credit,
    DigitalWallet,
}

impl AccountType {
    /// Default account type when a bank message does not say.
    /// Nequi and DaviPlata are wallet products; everything else defaults
    /// to a savings account.
    pub fn default_for(bank: BankCode) -> Self {
        if bank.is_digital_wallet() {
            AccountType::DigitalWallet
        } else {
            AccountType::Savings
        }
    }
}

/// A bank account discovered from messages, statements or backups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub bank_code: BankCode,
    pub bank_name: String,
    /// Full number from statements, last-4 from SMS, or "unknown"
    pub account_number: String,
    pub account_type: AccountType,
    /// Cached balance in whole pesos. Updated per committed candidate;
    /// overwritten by the authoritative balance on statement reconciliation.
    pub balance: i64,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(bank_code: BankCode, account_number: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            id: Uuid::new_v4(),
            bank_code,
            bank_name: bank_code.display_name().to_string(),
            account_number: account_number.into(),
            account_type,
            balance: 0,
            is_active: true,
            last_synced_at: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_account_type() {
        assert_eq!(AccountType::default_for(BankCode::Nequi), AccountType::DigitalWallet);
        assert_eq!(AccountType::default_for(BankCode::Daviplata), AccountType::DigitalWallet);
        assert_eq!(AccountType::default_for(BankCode::Bancolombia), AccountType::Savings);
    }
}
