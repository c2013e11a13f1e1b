//! Bank identity: codes, display names and SMS sender tables

use serde::{Deserialize, Serialize};

/// Banks whose notification messages the engine understands.
///
/// Adding a bank means adding one variant here plus one extractor module
/// under `parser::banks`; the dispatch match is exhaustive so the compiler
/// flags every site that needs the new arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankCode {
    Bancolombia,
    Davivienda,
    Bbva,
    Nequi,
    Daviplata,
}

impl BankCode {
    pub const ALL: [BankCode; 5] = [
        BankCode::Bancolombia,
        BankCode::Davivienda,
        BankCode::Bbva,
        BankCode::Nequi,
        BankCode::Daviplata,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            BankCode::Bancolombia => "Bancolombia",
            BankCode::Davivienda => "Davivienda",
            BankCode::Bbva => "BBVA",
            BankCode::Nequi => "Nequi",
            BankCode::Daviplata => "DaviPlata",
        }
    }

    /// Alphanumeric sender ids used by each bank, lowercase
    fn sender_names(&self) -> &'static [&'static str] {
        match self {
            BankCode::Bancolombia => &["bancolombia"],
            BankCode::Davivienda => &["davivienda"],
            BankCode::Bbva => &["bbva"],
            BankCode::Nequi => &["nequi"],
            BankCode::Daviplata => &["daviplata"],
        }
    }

    /// Numeric shortcodes each bank sends from
    fn sender_shortcodes(&self) -> &'static [&'static str] {
        match self {
            BankCode::Bancolombia => &["891333", "85954"],
            BankCode::Davivienda => &["85327"],
            BankCode::Bbva => &["87703"],
            BankCode::Nequi => &["85432"],
            BankCode::Daviplata => &["85255"],
        }
    }

    /// Does this sender address belong to the bank?
    ///
    /// Alphanumeric senders must match exactly (case-insensitive).
    /// Shortcodes match on prefix: carriers append routing digits to the
    /// base code on some networks.
    pub fn matches_sender(&self, sender: &str) -> bool {
        let sender = sender.trim();
        let lowered = sender.to_lowercase();

        if self.sender_names().iter().any(|name| lowered == *name) {
            return true;
        }

        sender.chars().all(|c| c.is_ascii_digit())
            && self
                .sender_shortcodes()
                .iter()
                .any(|code| sender.starts_with(code))
    }

    /// Does the message body name the bank?
    ///
    /// Used only as a fallback when the sender address is unknown; a sender
    /// match always wins because body text is spoofable.
    pub fn matches_body(&self, body: &str) -> bool {
        let lowered = body.to_lowercase();
        self.sender_names().iter().any(|name| lowered.contains(name))
    }

    /// Resolve a sender address to a bank
    pub fn from_sender(sender: &str) -> Option<BankCode> {
        BankCode::ALL.iter().copied().find(|b| b.matches_sender(sender))
    }

    /// Resolve a message body to a bank by keyword presence
    pub fn from_body(body: &str) -> Option<BankCode> {
        BankCode::ALL.iter().copied().find(|b| b.matches_body(body))
    }

    /// Wallet products without a conventional account number
    pub fn is_digital_wallet(&self) -> bool {
        matches!(self, BankCode::Nequi | BankCode::Daviplata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_name_match_is_exact() {
        assert_eq!(BankCode::from_sender("Bancolombia"), Some(BankCode::Bancolombia));
        assert_eq!(BankCode::from_sender("BANCOLOMBIA"), Some(BankCode::Bancolombia));
        assert_eq!(BankCode::from_sender("Bancolombia Promos"), None);
    }

    #[test]
    fn test_shortcode_match_tolerates_suffix() {
        assert_eq!(BankCode::from_sender("85954"), Some(BankCode::Bancolombia));
        assert_eq!(BankCode::from_sender("8595401"), Some(BankCode::Bancolombia));
        assert_eq!(BankCode::from_sender("85432"), Some(BankCode::Nequi));
        assert_eq!(BankCode::from_sender("99999"), None);
    }

    #[test]
    fn test_body_detection() {
        assert_eq!(
            BankCode::from_body("Tu cuenta Nequi recibio un pago"),
            Some(BankCode::Nequi)
        );
        assert_eq!(BankCode::from_body("gana un premio ya"), None);
    }

    #[test]
    fn test_daviplata_not_shadowed_by_davivienda() {
        assert_eq!(BankCode::from_sender("DaviPlata"), Some(BankCode::Daviplata));
        assert_eq!(BankCode::from_body("DaviPlata: Recibiste $5.000"), Some(BankCode::Daviplata));
    }
}
