// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Decimal-string money amounts.
//!
//! Amounts cross the API as decimal strings (e.g. "125.50") and persist as
//! integer minor units, so no float arithmetic touches money.

/// Parse a non-negative decimal amount string into minor units (cents).
///
/// Accepts at most two fraction digits; a single fraction digit means tens
/// of cents ("5.5" → 550).
pub fn parse_decimal_to_minor(amount: &str) -> Result<u64, String> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err("amount must be a valid positive number".to_string());
    }

    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.len() > 2 {
        return Err("amount must be a valid positive number".to_string());
    }

    let whole_part = parts[0];
    if whole_part.is_empty() || !whole_part.chars().all(|c| c.is_ascii_digit()) {
        return Err("amount must be a valid positive number".to_string());
    }

    let whole = whole_part
        .parse::<u64>()
        .map_err(|_| "amount is too large".to_string())?;

    let fraction_part = if parts.len() == 2 { parts[1] } else { "" };
    if !fraction_part.chars().all(|c| c.is_ascii_digit()) || fraction_part.len() > 2 {
        return Err("amount must have at most two decimal places".to_string());
    }

    let fraction = match fraction_part.len() {
        0 => 0,
        1 => fraction_part.parse::<u64>().unwrap_or(0) * 10,
        _ => fraction_part.parse::<u64>().unwrap_or(0),
    };

    whole
        .checked_mul(100)
        .and_then(|minor| minor.checked_add(fraction))
        .ok_or_else(|| "amount is too large".to_string())
}

/// Format minor units back into a two-decimal string.
pub fn format_minor(minor: u64) -> String {
    format!("{}.{:02}", minor / 100, minor % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_fractional_amounts() {
        assert_eq!(parse_decimal_to_minor("25"), Ok(2500));
        assert_eq!(parse_decimal_to_minor("25.50"), Ok(2550));
        assert_eq!(parse_decimal_to_minor("25.5"), Ok(2550));
        assert_eq!(parse_decimal_to_minor("0.05"), Ok(5));
        assert_eq!(parse_decimal_to_minor(" 10.00 "), Ok(1000));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert!(parse_decimal_to_minor("").is_err());
        assert!(parse_decimal_to_minor("abc").is_err());
        assert!(parse_decimal_to_minor("-5").is_err());
        assert!(parse_decimal_to_minor("1.2.3").is_err());
        assert!(parse_decimal_to_minor("1.234").is_err());
        assert!(parse_decimal_to_minor(".50").is_err());
    }

    #[test]
    fn format_round_trips() {
        for raw in ["0.00", "12.05", "125.50", "9999.99"] {
            let minor = parse_decimal_to_minor(raw).unwrap();
            assert_eq!(format_minor(minor), raw);
        }
    }
}
