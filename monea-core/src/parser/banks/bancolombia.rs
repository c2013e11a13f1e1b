//! Bancolombia message templates
//!
//! Wording: "Bancolombia le informa <verbo> por $X en/de/a <quien> ..."
//! with optional masked account and trailing balance. Some campaigns use
//! "te informa" instead of "le informa".

use std::sync::OnceLock;

use crate::domain::TransactionType;

use super::{account_tail, balance_tail, Template, AMOUNT, MERCHANT};

pub(crate) fn templates() -> &'static [Template] {
    static TEMPLATES: OnceLock<Vec<Template>> = OnceLock::new();
    TEMPLATES.get_or_init(|| {
        let preamble = r"(?i)Bancolombia\s+(?:le|te)\s+informa";
        let card = account_tail("T");
        let cta = account_tail("Cta|Cuenta");
        let tail = balance_tail();
        vec![
            Template::new(
                TransactionType::Expense,
                &format!(
                    r"{preamble}\s+(?:compra|pago)\s+por\s+{AMOUNT}\s+en\s+{MERCHANT}{card}{tail}"
                ),
            ),
            Template::new(
                TransactionType::Expense,
                &format!(r"{preamble}\s+retiro\s+por\s+{AMOUNT}(?:\s+en\s+{MERCHANT})?{cta}{tail}"),
            ),
            // "enviada" is explicit; a bare "transferencia por X a Y" is
            // outgoing only when the recipient clause is present, so the
            // received-transfer template below cannot shadow it.
            Template::new(
                TransactionType::TransferOut,
                &format!(
                    r"{preamble}\s+transferencia\s+enviada\s+por\s+{AMOUNT}(?:\s+a\s+{MERCHANT})?{cta}{tail}"
                ),
            ),
            Template::new(
                TransactionType::TransferOut,
                &format!(
                    r"{preamble}\s+transferencia\s+por\s+{AMOUNT}\s+a\s+{MERCHANT}{cta}{tail}"
                ),
            ),
            Template::new(
                TransactionType::Income,
                &format!(
                    r"{preamble}\s+(?:transferencia|recepcion|consignacion)\s+(?:recibida\s+)?por\s+{AMOUNT}(?:\s+de\s+{MERCHANT})?{cta}{tail}"
                ),
            ),
        ]
    })
}
