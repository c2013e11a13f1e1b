//! Portable backup document
//!
//! The JSON shape exchanged between devices:
//! `{ metadata: { version, exportedAt, app }, data: { accounts, transactions, categories } }`.
//! Deserialization is strict on required fields; unknown extra fields are
//! ignored. The version is an integer compared with `>`: future versions
//! are rejected, equal or older accepted.

use serde::{Deserialize, Serialize};

use super::account::AccountType;
use super::bank::BankCode;
use super::transaction::TransactionType;

/// Newest backup schema this build can read
pub const BACKUP_VERSION: u32 = 1;

pub const APP_NAME: &str = "monea";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub version: u32,
    pub exported_at: String,
    pub app: BackupApp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupApp {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountExport {
    /// Foreign id, remapped to a local id on import
    pub id: String,
    pub bank_code: BankCode,
    pub bank_name: String,
    pub account_number: String,
    pub account_type: AccountType,
    pub balance: i64,
    pub is_active: bool,
    pub last_synced_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionExport {
    pub id: String,
    pub account_id: String,
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub balance_after: Option<i64>,
    pub merchant: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    /// Unix milliseconds
    pub transaction_date: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryExport {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub is_system: bool,
    pub is_income: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPayload {
    pub accounts: Vec<AccountExport>,
    pub transactions: Vec<TransactionExport>,
    pub categories: Vec<CategoryExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupData {
    pub metadata: BackupMetadata,
    pub data: BackupPayload,
}

/// Import mode. Merge skips entities that already exist locally rather
/// than overwriting them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStrategy {
    #[default]
    Merge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_and_ignores_unknown_fields() {
        let json = r#"{
            "metadata": {
                "version": 1,
                "exportedAt": "2025-06-01T12:00:00.000Z",
                "app": { "name": "monea", "version": "1.4.0", "build": 77 }
            },
            "data": {
                "accounts": [{
                    "id": "a1",
                    "bankCode": "bancolombia",
                    "bankName": "Bancolombia",
                    "accountNumber": "1234",
                    "accountType": "savings",
                    "balance": 250000,
                    "isActive": true,
                    "lastSyncedAt": null,
                    "createdAt": 1717243200000
                }],
                "transactions": [],
                "categories": []
            }
        }"#;

        let parsed: BackupData = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.metadata.version, 1);
        assert_eq!(parsed.data.accounts.len(), 1);
        assert_eq!(parsed.data.accounts[0].bank_code, BankCode::Bancolombia);
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        // no metadata.version
        let json = r#"{
            "metadata": { "exportedAt": "x", "app": { "name": "monea", "version": "1.0" } },
            "data": { "accounts": [], "transactions": [], "categories": [] }
        }"#;
        assert!(serde_json::from_str::<BackupData>(json).is_err());
    }
}
