//! Colombian peso amount parsing
//!
//! Bank messages and statements format COP with `.` as the thousands
//! separator and an occasional `,dd` decimal tail, e.g. `$45.000`,
//! `$1.250.000`, `1.250.000,50`. Amounts are normalized to whole pesos.

/// Parse a currency-formatted token into whole pesos.
///
/// Accepts an optional leading `$` and embedded whitespace. A trailing
/// `,d` or `,dd` is treated as decimals and rounded away; every other `.`
/// and `,` is a group separator. Returns `None` for tokens with no digits
/// or that do not survive normalization. The sign is preserved so
/// statement rows can carry debit amounts.
pub fn parse_amount(input: &str) -> Option<i64> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let trimmed = compact.strip_prefix('$').unwrap_or(&compact);

    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = if has_decimal_tail(trimmed) {
        let standardized = trimmed.replace('.', "").replace(',', ".");
        standardized.parse::<f64>().ok()?
    } else {
        let plain: String = trimmed.chars().filter(|c| *c != '.' && *c != ',').collect();
        plain.parse::<i64>().ok()? as f64
    };

    if !value.is_finite() {
        return None;
    }

    Some(value.round() as i64)
}

/// Parse an amount and require it to be strictly positive
pub fn parse_positive_amount(input: &str) -> Option<i64> {
    parse_amount(input).filter(|v| *v > 0)
}

/// Does the token end in a `,d`/`,dd` decimal part?
fn has_decimal_tail(token: &str) -> bool {
    match token.rfind(',') {
        None => false,
        Some(idx) => {
            let after = &token[idx + 1..];
            !after.is_empty() && after.len() <= 2 && after.chars().all(|c| c.is_ascii_digit())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands_separated() {
        assert_eq!(parse_amount("$45.000"), Some(45_000));
        assert_eq!(parse_amount("$1.250.000"), Some(1_250_000));
        assert_eq!(parse_amount("250000"), Some(250_000));
    }

    #[test]
    fn test_decimal_tail_rounds_to_whole_pesos() {
        assert_eq!(parse_amount("1.250.000,50"), Some(1_250_001));
        assert_eq!(parse_amount("12.345,4"), Some(12_345));
    }

    #[test]
    fn test_english_grouping_still_parses() {
        assert_eq!(parse_amount("1,250,000"), Some(1_250_000));
    }

    #[test]
    fn test_sign_preserved() {
        assert_eq!(parse_amount("-15.000"), Some(-15_000));
        assert_eq!(parse_positive_amount("-15.000"), None);
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("sin monto"), None);
    }

    #[test]
    fn test_embedded_whitespace() {
        assert_eq!(parse_amount("$ 45.000"), Some(45_000));
    }
}
