//! Message classifier: which bank sent this, and what kind of notice is it
//!
//! Pure function of the input. The sender address is checked against the
//! known-sender table first; body keywords are only a fallback because
//! anyone can put a bank's name inside a message body.

use serde::{Deserialize, Serialize};

use crate::domain::BankCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Purchase,
    Withdrawal,
    Transfer,
    PaymentDue,
    PaymentReceived,
    BalanceNotice,
    UnknownFinancial,
}

/// A message attributed to a bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub bank_code: BankCode,
    pub kind: MessageKind,
}

/// Classify a raw message. `None` means the message is not attributable
/// to any known bank and belongs in the failed-extraction queue.
pub fn classify(sender: &str, body: &str) -> Option<Classified> {
    let bank_code = BankCode::from_sender(sender).or_else(|| BankCode::from_body(body))?;

    Some(Classified {
        bank_code,
        kind: detect_kind(body),
    })
}

/// Keyword-based subtype detection over the folded body.
///
/// Order matters: "pago minimo" must win over "pago", withdrawal verbs
/// over the generic purchase verbs, and "saldo" only counts when no
/// movement verb was present.
fn detect_kind(body: &str) -> MessageKind {
    let folded = fold(body);

    const PAYMENT_DUE: &[&str] = &["pago minimo", "fecha limite", "pague antes", "cuota del mes"];
    const PAYMENT_RECEIVED: &[&str] = &["pago recibido", "recibimos tu pago", "pago exitoso de tu"];
    const WITHDRAWAL: &[&str] = &["retiro", "retiraste", "sacaste"];
    const TRANSFER: &[&str] = &[
        "transferencia",
        "transferiste",
        "enviaste",
        "te enviaron",
        "te transfirieron",
        "recibiste",
        "consignacion",
        "recepcion",
        "abono",
    ];
    const PURCHASE: &[&str] = &["compra", "compraste", "pagaste", "pago"];

    let contains_any = |needles: &[&str]| needles.iter().any(|n| folded.contains(n));

    if contains_any(PAYMENT_DUE) {
        MessageKind::PaymentDue
    } else if contains_any(PAYMENT_RECEIVED) {
        MessageKind::PaymentReceived
    } else if contains_any(WITHDRAWAL) {
        MessageKind::Withdrawal
    } else if contains_any(TRANSFER) {
        MessageKind::Transfer
    } else if contains_any(PURCHASE) {
        MessageKind::Purchase
    } else if folded.contains("saldo") || folded.contains("disponible") {
        MessageKind::BalanceNotice
    } else {
        MessageKind::UnknownFinancial
    }
}

/// Lowercase and strip the Spanish accents banks use inconsistently
fn fold(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            'ü' => 'u',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_match_beats_body_heuristics() {
        // Body names Nequi, but the sender is Bancolombia's shortcode:
        // the sender wins, body text is spoofable.
        let classified = classify("85954", "Pago con Nequi por $10.000").unwrap();
        assert_eq!(classified.bank_code, BankCode::Bancolombia);
    }

    #[test]
    fn test_body_fallback_when_sender_unknown() {
        let classified = classify("+573001112233", "Nequi: Recibiste $20.000 de Maria").unwrap();
        assert_eq!(classified.bank_code, BankCode::Nequi);
    }

    #[test]
    fn test_non_bank_message_is_unclassified() {
        assert!(classify("Claro", "Tu factura llega manana").is_none());
    }

    #[test]
    fn test_kind_detection_order() {
        let c = classify("Bancolombia", "Bancolombia le informa pago minimo de su tarjeta").unwrap();
        assert_eq!(c.kind, MessageKind::PaymentDue);

        let c = classify("Bancolombia", "Bancolombia le informa retiro por $100.000 en CAJERO").unwrap();
        assert_eq!(c.kind, MessageKind::Withdrawal);

        let c = classify("Nequi", "Nequi: Recibiste $20.000 de Maria").unwrap();
        assert_eq!(c.kind, MessageKind::Transfer);

        let c = classify("Bancolombia", "Bancolombia le informa compra por $45.000 en EXITO").unwrap();
        assert_eq!(c.kind, MessageKind::Purchase);

        let c = classify("Bancolombia", "Bancolombia informa saldo disponible $1.000.000").unwrap();
        assert_eq!(c.kind, MessageKind::BalanceNotice);
    }

    #[test]
    fn test_accent_folding() {
        let c = classify("Davivienda", "Davivienda: consignación recibida por $50.000").unwrap();
        assert_eq!(c.kind, MessageKind::Transfer);
    }
}
