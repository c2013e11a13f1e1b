//! BBVA message templates
//!
//! Wording: "BBVA: <verbo> [por] $X [en <quien>] [Cta *1234] ..."

use std::sync::OnceLock;

use crate::domain::TransactionType;

use super::{account_tail, balance_tail, Template, AMOUNT, MERCHANT};

pub(crate) fn templates() -> &'static [Template] {
    static TEMPLATES: OnceLock<Vec<Template>> = OnceLock::new();
    TEMPLATES.get_or_init(|| {
        let preamble = r"(?i)BBVA:";
        let cta = account_tail("Cta");
        let tail = balance_tail();
        vec![
            Template::new(
                TransactionType::Expense,
                &format!(
                    r"{preamble}\s*(?:compra|pago)\s+(?:por\s+)?{AMOUNT}\s+(?:en\s+)?{MERCHANT}{cta}{tail}"
                ),
            ),
            Template::new(
                TransactionType::Expense,
                &format!(
                    r"{preamble}\s*retiro\s+(?:por\s+)?{AMOUNT}(?:\s+en\s+{MERCHANT})?{cta}{tail}"
                ),
            ),
            Template::new(
                TransactionType::TransferOut,
                &format!(
                    r"{preamble}\s*transferencia\s+enviada\s+(?:por\s+)?{AMOUNT}(?:\s+a\s+{MERCHANT})?{cta}{tail}"
                ),
            ),
            Template::new(
                TransactionType::TransferOut,
                &format!(
                    r"{preamble}\s*transferencia\s+(?:por\s+)?{AMOUNT}\s+a\s+{MERCHANT}{cta}{tail}"
                ),
            ),
            Template::new(
                TransactionType::Income,
                &format!(
                    r"{preamble}\s*(?:transferencia|abono|consignacion)\s+(?:recibida?\s+)?(?:por\s+)?{AMOUNT}(?:\s+de\s+{MERCHANT})?{cta}{tail}"
                ),
            ),
        ]
    })
}
