//! Document statement decoder
//!
//! Reads page-structured PDF statements (the Nequi "extracto de cuenta"
//! layout): a header block naming the holder, account number and period, a
//! summary block with opening/closing balances, and a dated movement table
//! that may span pages. Supports encrypted files via an optional password.

use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::domain::{
    AccountType, BankCode, CandidateSource, DecodeError, FailedExtraction, FailureReason,
    StatementResult, TransactionCandidate,
};
use crate::parser::{amount, date};

use super::{classify_row, detect_bank_from_file_name, file_fingerprint, merchant_from_description};

const HOLDER_PREFIX: &str = "Extracto de cuenta de ahorro de:";
const TRANSACTION_HEADER: &str = "Fecha del movimiento";
const OPENING_LABEL: &str = "Saldo anterior";
const CLOSING_LABEL: &str = "Saldo actual";

/// Lines that end the movement table
const SECTION_FOOTERS: &[&str] = &[
    OPENING_LABEL,
    CLOSING_LABEL,
    "Total abonos",
    "Total cargos",
    "Saldo promedio",
    "Cuentas por cobrar",
    "Valor de intereses",
    "Retefuente",
    "Resumen",
    "Las cuentas de ahorro Nequi",
];

pub fn decode(
    data: &[u8],
    file_name: &str,
    password: Option<&str>,
) -> Result<StatementResult, DecodeError> {
    let text = read_pdf_text(data, password)?;
    parse_document_text(&text, file_name, file_fingerprint(data))
}

fn read_pdf_text(data: &[u8], password: Option<&str>) -> Result<String, DecodeError> {
    let result = match password {
        Some(pw) => pdf_extract::extract_text_from_mem_encrypted(data, pw),
        None => pdf_extract::extract_text_from_mem(data),
    };

    result.map_err(|err| {
        let message = err.to_string();
        if is_password_failure(&message) {
            DecodeError::IncorrectPassword
        } else {
            DecodeError::MalformedFile(message)
        }
    })
}

/// Distinguish "wrong or missing password" from structural damage so the
/// caller can re-prompt instead of aborting
fn is_password_failure(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("password") || lowered.contains("encrypt") || lowered.contains("decrypt")
}

pub(crate) fn parse_document_text(
    text: &str,
    file_name: &str,
    fingerprint: String,
) -> Result<StatementResult, DecodeError> {
    static ACCOUNT_RE: OnceLock<Regex> = OnceLock::new();
    static PERIOD_RE: OnceLock<Regex> = OnceLock::new();
    static SUMMARY_RE: OnceLock<Regex> = OnceLock::new();
    static ROW_RE: OnceLock<Regex> = OnceLock::new();

    let account_re = ACCOUNT_RE.get_or_init(|| {
        Regex::new(r"(?i)N[uú]mero de cuenta(?: de ahorro)?:\s*(\S+)").unwrap()
    });
    let period_re = PERIOD_RE.get_or_init(|| {
        Regex::new(r"(?i)per[ií]odo de:\s*(\d{4}/\d{2}/\d{2})\s+a\s+(\d{4}/\d{2}/\d{2})").unwrap()
    });
    let summary_re = SUMMARY_RE.get_or_init(|| {
        Regex::new(r"(?i)^(Saldo (?:anterior|actual))\s+\$?\s*(-?[\d.,]+)\s*$").unwrap()
    });
    let row_re = ROW_RE.get_or_init(|| {
        Regex::new(r"^(\d{2}/\d{2}/\d{4})\s+(.+?)\s+(-?\s*\$?\s*[\d.,]+)\s+(-?\s*\$?\s*[\d.,]+)\s*$")
            .unwrap()
    });

    let mut account_number = None;
    let mut holder_name = None;
    let mut period: Option<(NaiveDate, NaiveDate)> = None;
    let mut opening_balance = None;
    let mut closing_balance = None;
    let mut saw_transaction_header = false;
    let mut in_section = false;

    let mut candidates = Vec::new();
    let mut row_failures = Vec::new();
    let mut expect_holder = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if expect_holder {
            holder_name = Some(line.to_string());
            expect_holder = false;
        }
        if line == HOLDER_PREFIX {
            expect_holder = true;
        }

        if account_number.is_none() {
            if let Some(caps) = account_re.captures(line) {
                account_number = Some(caps[1].to_string());
            }
        }
        if period.is_none() {
            if let Some(caps) = period_re.captures(line) {
                let start = date::parse_year_month_day(&caps[1]);
                let end = date::parse_year_month_day(&caps[2]);
                if let (Some(start), Some(end)) = (start, end) {
                    period = Some((start, end));
                }
            }
        }
        if let Some(caps) = summary_re.captures(line) {
            let value = amount::parse_amount(&caps[2]);
            if caps[1].eq_ignore_ascii_case(OPENING_LABEL) {
                opening_balance = opening_balance.or(value);
            } else {
                closing_balance = closing_balance.or(value);
            }
        }

        if line.starts_with(TRANSACTION_HEADER) {
            saw_transaction_header = true;
            in_section = true;
            continue;
        }
        if in_section && SECTION_FOOTERS.iter().any(|f| line.starts_with(f)) {
            in_section = false;
            continue;
        }

        if in_section {
            match parse_row(row_re, line) {
                RowOutcome::Transaction(c) => candidates.push(c),
                RowOutcome::Failed(reason) => row_failures.push(FailedExtraction::new(
                    file_name,
                    line,
                    CandidateSource::StatementPdf,
                    reason,
                    Utc::now(),
                )),
                RowOutcome::NotARow => {}
            }
        }
    }

    if !saw_transaction_header {
        return Err(DecodeError::MalformedFile(
            "no movement table found in document".to_string(),
        ));
    }
    let account_number = account_number.ok_or_else(|| {
        DecodeError::MalformedFile("could not extract account number".to_string())
    })?;
    let (period_start, period_end) = period.ok_or_else(|| {
        DecodeError::MalformedFile("could not extract statement period".to_string())
    })?;
    let statement_balance = closing_balance.ok_or_else(|| {
        DecodeError::MalformedFile("could not extract closing balance".to_string())
    })?;

    // Reconciliation commits in date order; sort once here.
    candidates.sort_by_key(|c| c.occurred_at);

    Ok(StatementResult {
        bank_code: detect_bank_from_file_name(file_name)
            .or_else(|| super::detect_bank_from_text(text))
            .or(Some(BankCode::Nequi)),
        account_number,
        account_type: AccountType::Savings,
        holder_name,
        period_start,
        period_end,
        opening_balance,
        statement_balance,
        candidates,
        row_failures,
        file_name: file_name.to_string(),
        file_fingerprint: fingerprint,
    })
}

enum RowOutcome {
    Transaction(TransactionCandidate),
    Failed(FailureReason),
    NotARow,
}

fn parse_row(row_re: &Regex, line: &str) -> RowOutcome {
    // Anything inside the section that does not lead with a date is
    // layout noise (wrapped descriptions, page furniture), not a failure.
    if !line
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
    {
        return RowOutcome::NotARow;
    }

    let Some(caps) = row_re.captures(line) else {
        return RowOutcome::Failed(FailureReason::UnparseableAmount);
    };

    let Some(occurred_at) = date::parse_sms_date(&caps[1], None) else {
        return RowOutcome::Failed(FailureReason::UnparseableDate);
    };
    let Some(signed_amount) = amount::parse_amount(&caps[3]) else {
        return RowOutcome::Failed(FailureReason::UnparseableAmount);
    };
    if signed_amount == 0 {
        return RowOutcome::Failed(FailureReason::UnparseableAmount);
    }
    let balance = amount::parse_amount(&caps[4]);

    let description = caps[2].trim().to_string();
    let direction = classify_row(&description, signed_amount < 0);

    RowOutcome::Transaction(TransactionCandidate {
        source: CandidateSource::StatementPdf,
        bank_code: BankCode::Nequi,
        direction,
        amount: signed_amount.abs(),
        occurred_at,
        counterparty: merchant_from_description(&description),
        description: Some(description),
        reference: None,
        account_last4: None,
        running_balance: balance,
        raw_payload: line.to_string(),
    })
}
