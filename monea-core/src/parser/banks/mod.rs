//! Per-bank field extractors
//!
//! Banks do not share an SMS grammar, so each bank owns its template set
//! and nothing else: adding a bank is one new module plus one arm in the
//! dispatch match below. Templates are regexes with named capture groups
//! (`amount`, `merchant`, `account`, `balance`); the embedded date is cut
//! out of the body before matching, and the shared builder turns a match
//! into a `TransactionCandidate`.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::domain::{
    BankCode, CandidateSource, FailureReason, TransactionCandidate, TransactionType,
};
use crate::parser::classifier::Classified;
use crate::parser::date::DateCapture;
use crate::parser::{amount, date, merchant};

mod bancolombia;
mod bbva;
mod daviplata;
mod davivienda;
mod nequi;

/// One message template: a wording pattern plus the direction it implies
pub(crate) struct Template {
    pub direction: TransactionType,
    pub pattern: Regex,
}

impl Template {
    pub(crate) fn new(direction: TransactionType, pattern: &str) -> Self {
        Self {
            direction,
            pattern: Regex::new(pattern).unwrap(),
        }
    }
}

// Shared pattern fragments, mirroring the wording all five banks use.
pub(crate) const AMOUNT: &str = r"\$?\s*(?P<amount>[\d.,]+)";
pub(crate) const MERCHANT: &str =
    r"(?P<merchant>[A-Za-z0-9][A-Za-z0-9\s]*[A-Za-z0-9]|[A-Za-z0-9])";

/// Optional masked-account clause, e.g. ". T *4321" or ". Cta 9876"
pub(crate) fn account_tail(label: &str) -> String {
    format!(r"(?:[\s.,]*(?:{label})\.?\s*\**(?P<account>\d{{4}}))?")
}

/// Optional trailing available-balance clause
pub(crate) fn balance_tail() -> String {
    r"(?:[\s.,]*(?:Saldo|Disponible|Disp):?\s*\$?\s*(?P<balance>[\d.,]+))?".to_string()
}

/// Run the classified message through its bank's templates
pub fn extract(
    classified: &Classified,
    body: &str,
    received_at: DateTime<Utc>,
    source: CandidateSource,
) -> Result<TransactionCandidate, FailureReason> {
    let templates: &[Template] = match classified.bank_code {
        BankCode::Bancolombia => bancolombia::templates(),
        BankCode::Davivienda => davivienda::templates(),
        BankCode::Bbva => bbva::templates(),
        BankCode::Nequi => nequi::templates(),
        BankCode::Daviplata => daviplata::templates(),
    };

    let (cleaned, embedded) = date::split_embedded_datetime(body);

    for template in templates {
        if let Some(caps) = template.pattern.captures(&cleaned) {
            let occurred_at = match embedded {
                DateCapture::Valid(dt) => dt,
                DateCapture::None => received_at,
                DateCapture::Malformed => return Err(FailureReason::UnparseableDate),
            };
            return candidate_from_captures(
                classified.bank_code,
                template.direction,
                &caps,
                body,
                occurred_at,
                source,
            );
        }
    }

    Err(FailureReason::UnrecognizedTemplate)
}

fn candidate_from_captures(
    bank_code: BankCode,
    direction: TransactionType,
    caps: &regex::Captures<'_>,
    body: &str,
    occurred_at: DateTime<Utc>,
    source: CandidateSource,
) -> Result<TransactionCandidate, FailureReason> {
    let amount = caps
        .name("amount")
        .and_then(|m| amount::parse_positive_amount(m.as_str()))
        .ok_or(FailureReason::UnparseableAmount)?;

    let counterparty = caps
        .name("merchant")
        .and_then(|m| merchant::normalize_merchant(m.as_str()));
    let running_balance = caps
        .name("balance")
        .and_then(|m| amount::parse_amount(m.as_str()));
    let account_last4 = caps.name("account").map(|m| m.as_str().to_string());

    Ok(TransactionCandidate {
        source,
        bank_code,
        direction,
        amount,
        occurred_at,
        counterparty,
        description: merchant::extract_description(body),
        reference: merchant::extract_reference(body),
        account_last4,
        running_balance,
        raw_payload: body.to_string(),
    })
}
