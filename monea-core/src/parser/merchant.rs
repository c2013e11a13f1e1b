//! Merchant, reference and description extraction
//!
//! Bank messages append legal suffixes, tax ids and phone numbers to
//! merchant names. Normalization strips that noise and title-cases the
//! remainder so "EXITO  S.A.S NIT 890900608" and "Exito" dedupe to the
//! same counterparty.

use std::sync::OnceLock;

use regex::Regex;

fn noise_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)\bS\.?A\.?S?\.?\b",
            r"(?i)\bLTDA\.?\b",
            r"(?i)\bCIA\.?\b",
            r"(?i)\bINC\.?\b",
            r"(?i)\bCORP\.?\b",
            r"(?i)\bNIT[\s:]*[\d-]+",
            r"(?i)\bCC[\s:]*[\d-]+",
            r"(?i)\bTEL[\s:.]*[\d-]+",
            r"(?i)\bCEL[\s:.]*[\d-]+",
            r"\*+",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Normalize a raw merchant capture, keeping the bank's casing;
/// `None` when nothing usable remains
pub fn normalize_merchant(input: &str) -> Option<String> {
    let mut cleaned = input.trim().to_string();
    if cleaned.is_empty() {
        return None;
    }

    for pattern in noise_patterns() {
        cleaned = pattern.replace_all(&cleaned, " ").into_owned();
    }

    let cleaned = cleaned.trim_matches(|c: char| c.is_whitespace() || c == '-' || c == '.' || c == '*');
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.len() < 2 {
        return None;
    }

    Some(collapsed)
}

/// Title-case free-text segments (descriptions/concepts); one/two-letter
/// tokens are acronyms and go fully uppercase unless they are Spanish
/// connectives.
fn capitalize_words(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if word.len() <= 2 && !matches!(lowered.as_str(), "de" | "el" | "la" | "en" | "y" | "a") {
                return word.to_uppercase();
            }
            let mut chars = lowered.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pull a bank reference number out of the message body when present
pub fn extract_reference(body: &str) -> Option<String> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r"(?i)\bref(?:erencia)?\.?[\s:]+([A-Za-z0-9]+)",
            r"(?i)\b(?:comprobante|nro|num(?:ero)?)[\s:.]+([A-Za-z0-9]+)",
            r"(?i)\baprobaci[oó]n[\s:]+([A-Za-z0-9]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    });

    for pattern in patterns {
        if let Some(caps) = pattern.captures(body) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().to_uppercase());
            }
        }
    }
    None
}

/// Pull a free-text concept/detail segment when the template carries one
pub fn extract_description(body: &str) -> Option<String> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r"(?i)\b(?:concepto|descripcion|detalle|motivo)[\s:]+([^.\n]+)",
            r"(?i)\bpor\s+concepto\s+de[\s:]+([^.\n]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    });

    for pattern in patterns {
        if let Some(caps) = pattern.captures(body) {
            if let Some(m) = caps.get(1) {
                let description = m.as_str().trim();
                if description.len() >= 3 {
                    return Some(capitalize_words(description));
                }
            }
        }
    }
    None
}
