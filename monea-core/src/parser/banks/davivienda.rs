//! Davivienda message templates
//!
//! Wording: "Davivienda: <verbo> [por] $X [en/de/a <quien>] ..."

use std::sync::OnceLock;

use crate::domain::TransactionType;

use super::{balance_tail, Template, AMOUNT, MERCHANT};

pub(crate) fn templates() -> &'static [Template] {
    static TEMPLATES: OnceLock<Vec<Template>> = OnceLock::new();
    TEMPLATES.get_or_init(|| {
        let preamble = r"(?i)Davivienda:";
        let tail = balance_tail();
        vec![
            Template::new(
                TransactionType::Expense,
                &format!(
                    r"{preamble}\s*(?:compra|pago)\s+(?:por\s+)?{AMOUNT}\s+(?:en\s+)?{MERCHANT}{tail}"
                ),
            ),
            Template::new(
                TransactionType::Expense,
                &format!(r"{preamble}\s*retiro\s+(?:por\s+)?{AMOUNT}(?:\s+en\s+{MERCHANT})?{tail}"),
            ),
            Template::new(
                TransactionType::TransferOut,
                &format!(
                    r"{preamble}\s*transferencia\s+enviada\s+(?:por\s+)?{AMOUNT}(?:\s+a\s+{MERCHANT})?{tail}"
                ),
            ),
            Template::new(
                TransactionType::TransferOut,
                &format!(
                    r"{preamble}\s*transferencia\s+(?:por\s+)?{AMOUNT}\s+a\s+{MERCHANT}{tail}"
                ),
            ),
            Template::new(
                TransactionType::Income,
                &format!(
                    r"{preamble}\s*(?:transferencia|abono|consignacion)\s+(?:recibida?\s+)?(?:por\s+)?{AMOUNT}(?:\s+de\s+{MERCHANT})?{tail}"
                ),
            ),
        ]
    })
}
