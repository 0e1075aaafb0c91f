//! Amount parsing for OCR'd money and quantity cells.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::ExtractionMatch;
use super::patterns::{CURRENCY, NUMERIC};

/// Confidence given to a value whose sign had to be dropped.
const SIGN_DROPPED_CONFIDENCE: f32 = 0.5;

/// Parse a money or quantity cell.
///
/// Strips currency markers and spaces, resolves thousands versus decimal
/// separators and drops a leading minus at reduced confidence. Returns `None`
/// when the cell does not read as a number.
pub fn parse_amount(raw: &str) -> Option<ExtractionMatch<Decimal>> {
    let stripped = CURRENCY.replace_all(raw, "");
    let mut cleaned: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();

    let negative = cleaned.starts_with('-');
    if negative {
        cleaned.remove(0);
    }

    let cleaned = cleaned.trim_end_matches(['.', ',']);
    if !NUMERIC.is_match(cleaned) {
        return None;
    }

    let value = Decimal::from_str(&normalize_separators(cleaned)).ok()?;
    let confidence = if negative { SIGN_DROPPED_CONFIDENCE } else { 1.0 };

    Some(ExtractionMatch::new(value, confidence, raw.trim()))
}

/// Rewrite a digits-and-separators string into `Decimal` syntax.
fn normalize_separators(s: &str) -> String {
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();

    match (commas, dots) {
        (0, _) if dots <= 1 => s.to_string(),
        (0, _) => s.replace('.', ""),
        (1, 0) if !groups_thousands(s, ',') => s.replace(',', "."),
        (_, 0) => s.replace(',', ""),
        _ => {
            // Whichever separator comes last is the decimal point.
            let last_comma = s.rfind(',').unwrap_or(0);
            let last_dot = s.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
    }
}

/// A lone separator followed by exactly three digits groups thousands.
fn groups_thousands(s: &str, sep: char) -> bool {
    s.rsplit(sep).next().is_some_and(|tail| tail.len() == 3)
}

/// Round money to two places for export.
pub fn to_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn amount(s: &str) -> Option<Decimal> {
        parse_amount(s).map(|m| m.value)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_plain_amounts() {
        assert_eq!(amount("400"), Some(dec("400")));
        assert_eq!(amount("1234.56"), Some(dec("1234.56")));
        assert_eq!(amount(" 2 "), Some(dec("2")));
    }

    #[test]
    fn test_comma_thousands_separator() {
        assert_eq!(amount("1,500"), Some(dec("1500")));
        assert_eq!(amount("12,345,678"), Some(dec("12345678")));
    }

    #[test]
    fn test_comma_decimal() {
        assert_eq!(amount("12,50"), Some(dec("12.50")));
        assert_eq!(amount("3,5"), Some(dec("3.5")));
    }

    #[test]
    fn test_mixed_separators_last_is_decimal() {
        assert_eq!(amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(amount("1.234,56"), Some(dec("1234.56")));
    }

    #[test]
    fn test_currency_markers_are_stripped() {
        assert_eq!(amount("KSh 1,500"), Some(dec("1500")));
        assert_eq!(amount("KES2,000.00"), Some(dec("2000.00")));
        assert_eq!(amount("850/="), Some(dec("850")));
        assert_eq!(amount("Kshs. 300/-"), Some(dec("300")));
        assert_eq!(amount("$12"), Some(dec("12")));
    }

    #[test]
    fn test_negative_is_dropped_at_low_confidence() {
        let m = parse_amount("-250").unwrap();
        assert_eq!(m.value, dec("250"));
        assert!(m.confidence < 1.0);
        assert_eq!(parse_amount("250").unwrap().confidence, 1.0);
    }

    #[test]
    fn test_noise_does_not_parse() {
        assert_eq!(amount("l2,5OO"), None);
        assert_eq!(amount("N/A"), None);
        assert_eq!(amount(""), None);
        assert_eq!(amount("KSh"), None);
    }

    #[test]
    fn test_trailing_separator() {
        assert_eq!(amount("400."), Some(dec("400")));
    }

    #[test]
    fn test_to_money() {
        assert_eq!(to_money(dec("333.3333")), dec("333.33"));
        assert_eq!(to_money(dec("400")), dec("400"));
    }
}
