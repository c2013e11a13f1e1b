//! DaviPlata message templates
//!
//! Same second-person verb scheme as Nequi, with "Pago/Compra" nouns for
//! expenses.

use std::sync::OnceLock;

use crate::domain::TransactionType;

use super::{balance_tail, Template, AMOUNT, MERCHANT};

pub(crate) fn templates() -> &'static [Template] {
    static TEMPLATES: OnceLock<Vec<Template>> = OnceLock::new();
    TEMPLATES.get_or_init(|| {
        let preamble = r"(?i)DaviPlata:";
        let tail = balance_tail();
        vec![
            Template::new(
                TransactionType::Expense,
                &format!(
                    r"{preamble}\s*(?:Pago|Compra)\s+(?:por\s+)?{AMOUNT}\s+(?:en\s+)?{MERCHANT}{tail}"
                ),
            ),
            Template::new(
                TransactionType::Expense,
                &format!(r"{preamble}\s*Retiro\s+(?:por\s+)?{AMOUNT}(?:\s+en\s+{MERCHANT})?{tail}"),
            ),
            Template::new(
                TransactionType::Income,
                &format!(
                    r"{preamble}\s*(?:Recibiste|Te\s+enviaron)\s+{AMOUNT}(?:\s+de\s+{MERCHANT})?{tail}"
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
