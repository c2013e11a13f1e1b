//! Nequi message templates
//!
//! Nequi speaks to the user in second person with distinct verbs per
//! movement, and never embeds a date; arrival time stands in for it.

use std::sync::OnceLock;

use crate::domain::TransactionType;

use super::{balance_tail, Template, AMOUNT, MERCHANT};

pub(crate) fn templates() -> &'static [Template] {
    static TEMPLATES: OnceLock<Vec<Template>> = OnceLock::new();
    TEMPLATES.get_or_init(|| {
        let preamble = r"(?i)(?:\*Nequi\*|Nequi):";
        let tail = balance_tail();
        vec![
            Template::new(
                TransactionType::Expense,
                &format!(
                    r"{preamble}\s*(?:Pagaste|Compraste)\s+{AMOUNT}\s+(?:en\s+)?{MERCHANT}{tail}"
                ),
            ),
            Template::new(
                TransactionType::Expense,
                &format!(
                    r"{preamble}\s*(?:Retiraste|Sacaste)\s+{AMOUNT}(?:\s+en\s+{MERCHANT})?{tail}"
                ),
            ),
            Template::new(
                TransactionType::Income,
                &format!(
                    r"{preamble}\s*(?:Recibiste|Te\s+(?:enviaron|transfirieron))\s+{AMOUNT}(?:\s+de\s+{MERCHANT})?{tail}"
                ),
            ),
            Template::new(
                TransactionType::TransferOut,
                &format!(
                    r"{preamble}\s*(?:Enviaste|Transferiste)\s+{AMOUNT}(?:\s+a\s+{MERCHANT})?{tail}"
                ),
            ),
        ]
    })
}
