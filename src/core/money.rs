//! Currency parsing and formatting.
//!
//! Operators type amounts the way they read them on a receipt (`$ 1.234,50`), while the
//! ledger API sends canonical decimal strings (`1234.50`). All of that goes through
//! [`parse_amount`] so there is exactly one set of locale rules:
//!
//! 1. Whitespace and a `$` sign are ignored; a leading `-` is kept.
//! 2. When both `.` and `,` appear, the right-most one is the decimal separator and the
//!    other one separates thousands.
//! 3. A lone `,` is a decimal comma (`10,5` is ten and a half). Repeated `,` are
//!    thousands separators.
//! 4. A lone `.` followed by exactly three digits is a thousands separator (`1.500` is
//!    fifteen hundred), unless nothing but zeros comes before it (`0.500` is one half).
//!    Any other lone `.` is a decimal point. Repeated `.` are thousands separators.
//! 5. The first thousands group holds one to three digits and is not zero; the groups
//!    after it are exactly three digits wide.
//!
//! Output formatting follows the es-AR convention: two decimals, `.` for thousands and
//! `,` for decimals.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

/// Returned when a string is not a recognizable amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount '{input}': {reason}")]
pub struct ParseAmountError {
    /// The original input
    pub input: String,
    /// Why it was rejected
    pub reason: &'static str,
}

impl ParseAmountError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parses an operator- or server-supplied amount according to the module rules.
///
/// Negative values are returned as such; callers that require non-negative amounts
/// check the sign themselves.
///
/// # Errors
/// Returns [`ParseAmountError`] for empty input, non-numeric characters (including
/// `NaN` and `inf`), misplaced separators or values that overflow a [`Decimal`].
pub fn parse_amount(input: &str) -> Result<Decimal, ParseAmountError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let body = compact.strip_prefix('$').unwrap_or(&compact);
    let (negative, body) = body
        .strip_prefix('-')
        .map_or((false, body), |rest| (true, rest));
    let body = body.strip_prefix('$').unwrap_or(body);

    if body.is_empty() {
        return Err(ParseAmountError::new(input, "empty"));
    }
    if !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return Err(ParseAmountError::new(input, "unexpected character"));
    }

    let decimal_separator = detect_decimal_separator(body);
    let (integer_part, fraction_part) = match decimal_separator {
        Some(sep) => {
            if body.matches(sep).count() > 1 {
                return Err(ParseAmountError::new(input, "repeated decimal separator"));
            }
            body.split_once(sep)
                .ok_or_else(|| ParseAmountError::new(input, "missing decimal separator"))?
        }
        None => (body, ""),
    };

    if decimal_separator.is_some() && fraction_part.is_empty() {
        return Err(ParseAmountError::new(input, "missing decimal digits"));
    }
    if !fraction_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseAmountError::new(input, "separator inside decimals"));
    }

    let integer_digits = strip_thousands(integer_part)
        .ok_or_else(|| ParseAmountError::new(input, "malformed thousands grouping"))?;
    if integer_digits.is_empty() && fraction_part.is_empty() {
        return Err(ParseAmountError::new(input, "no digits"));
    }

    let integer_digits = if integer_digits.is_empty() {
        "0"
    } else {
        integer_digits.as_str()
    };
    let canonical = if fraction_part.is_empty() {
        integer_digits.to_string()
    } else {
        format!("{integer_digits}.{fraction_part}")
    };

    let value = Decimal::from_str_exact(&canonical)
        .map_err(|_| ParseAmountError::new(input, "out of range"))?;
    Ok(if negative { -value } else { value })
}

/// Parses an amount sent by the ledger API.
///
/// Canonical decimal strings are taken as-is; anything else falls back to
/// [`parse_amount`].
///
/// # Errors
/// Same as [`parse_amount`].
pub fn parse_wire_amount(input: &str) -> Result<Decimal, ParseAmountError> {
    Decimal::from_str(input.trim()).or_else(|_| parse_amount(input))
}

fn detect_decimal_separator(body: &str) -> Option<char> {
    let dots = body.matches('.').count();
    let commas = body.matches(',').count();

    match (dots, commas) {
        (0, 0) => None,
        (d, c) if d > 0 && c > 0 => {
            let last_dot = body.rfind('.');
            let last_comma = body.rfind(',');
            if last_dot > last_comma {
                Some('.')
            } else {
                Some(',')
            }
        }
        (0, 1) => Some(','),
        (1, 0) => {
            let (before, after) = body.split_once('.')?;
            if after.len() == 3 && !is_zero_group(before) {
                None
            } else {
                Some('.')
            }
        }
        _ => None,
    }
}

/// Removes thousands separators from an integer part, checking the grouping.
fn strip_thousands(integer_part: &str) -> Option<String> {
    if !integer_part.contains(['.', ',']) {
        return Some(integer_part.to_string());
    }

    let separator = if integer_part.contains('.') { '.' } else { ',' };
    if integer_part.contains('.') && integer_part.contains(',') {
        return None;
    }

    let mut groups = integer_part.split(separator);
    let first = groups.next()?;
    if first.len() > 3 || is_zero_group(first) {
        return None;
    }

    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

/// True for an empty or all-zero digit run, which can never lead a thousands grouping.
fn is_zero_group(digits: &str) -> bool {
    digits.bytes().all(|b| b == b'0')
}

/// Rounds to cents, half away from zero.
#[must_use]
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount as `1.234,50` (es-AR grouping, two decimals).
#[must_use]
pub fn format_amount(value: Decimal) -> String {
    let rounded = round_cents(value);
    let text = format!("{:.2}", rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{fraction}")
}

/// Formats an amount with a leading currency sign: `$1.234,50`, `-$20,00`.
#[must_use]
pub fn format_currency(value: Decimal) -> String {
    let formatted = format_amount(value);
    formatted.strip_prefix('-').map_or_else(
        || format!("${formatted}"),
        |magnitude| format!("-${magnitude}"),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_parse_plain_integers_and_decimals() {
        assert_eq!(parse_amount("1000").unwrap(), dec("1000"));
        assert_eq!(parse_amount("1000.50").unwrap(), dec("1000.50"));
        assert_eq!(parse_amount("0.5").unwrap(), dec("0.5"));
        assert_eq!(parse_amount("  42 ").unwrap(), dec("42"));
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_amount("10,5").unwrap(), dec("10.5"));
        assert_eq!(parse_amount("1000,25").unwrap(), dec("1000.25"));
        assert_eq!(parse_amount(",75").unwrap(), dec("0.75"));
    }

    #[test]
    fn test_parse_es_ar_thousands() {
        assert_eq!(parse_amount("1.500").unwrap(), dec("1500"));
        assert_eq!(parse_amount("1.234.567").unwrap(), dec("1234567"));
        assert_eq!(parse_amount("1.234,56").unwrap(), dec("1234.56"));
        assert_eq!(parse_amount("$ 12.000,00").unwrap(), dec("12000"));
    }

    #[test]
    fn test_parse_zero_led_dot_is_decimal() {
        assert_eq!(parse_amount("0.500").unwrap(), dec("0.5"));
        assert_eq!(parse_amount("0,500").unwrap(), dec("0.5"));
        assert_eq!(parse_amount(".500").unwrap(), dec("0.5"));
        assert_eq!(parse_amount("$ 00.750").unwrap(), dec("0.75"));
        assert_eq!(parse_amount("10.500").unwrap(), dec("10500"));
    }

    #[test]
    fn test_parse_en_us_thousands() {
        assert_eq!(parse_amount("1,234.56").unwrap(), dec("1234.56"));
        assert_eq!(parse_amount("1,234,567").unwrap(), dec("1234567"));
        assert_eq!(parse_amount("12,000.5").unwrap(), dec("12000.5"));
    }

    #[test]
    fn test_parse_signs_and_currency_symbol() {
        assert_eq!(parse_amount("-5").unwrap(), dec("-5"));
        assert_eq!(parse_amount("-$5,50").unwrap(), dec("-5.50"));
        assert_eq!(parse_amount("$-5").unwrap(), dec("-5"));
        assert_eq!(parse_amount("$1 000").unwrap(), dec("1000"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let inputs = [
            "", "   ", "$", "NaN", "inf", "12a", "1.2.3,4,5", "5,", "1.23.4", "1,2345.6", "-",
            "0.500.000", "0.500,00", "000,250.5",
        ];
        for input in inputs {
            assert!(parse_amount(input).is_err(), "expected '{input}' to be rejected");
        }
    }

    #[test]
    fn test_parse_error_reports_input() {
        let err = parse_amount("abc").unwrap_err();
        assert_eq!(err.input, "abc");
        assert_eq!(err.to_string(), "invalid amount 'abc': unexpected character");
    }

    #[test]
    fn test_parse_wire_amount_prefers_canonical() {
        // A canonical server decimal with three places stays a decimal.
        assert_eq!(parse_wire_amount("1.500").unwrap(), dec("1.5"));
        assert_eq!(parse_wire_amount("1000.00").unwrap(), dec("1000"));
        assert_eq!(parse_wire_amount("1.234,50").unwrap(), dec("1234.5"));
    }

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(dec("0")), "0,00");
        assert_eq!(format_amount(dec("5")), "5,00");
        assert_eq!(format_amount(dec("999.9")), "999,90");
        assert_eq!(format_amount(dec("1000")), "1.000,00");
        assert_eq!(format_amount(dec("1234567.891")), "1.234.567,89");
        assert_eq!(format_amount(dec("-50")), "-50,00");
    }

    #[test]
    fn test_format_amount_rounds_half_away_from_zero() {
        assert_eq!(format_amount(dec("0.005")), "0,01");
        assert_eq!(format_amount(dec("-0.005")), "-0,01");
        assert_eq!(format_amount(dec("-0.004")), "0,00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec("1234.5")), "$1.234,50");
        assert_eq!(format_currency(dec("-20")), "-$20,00");
    }
}
