//! Numeric parsing and rounding conventions shared by every calculator
//!
//! Weights are carried and serialized at 3 decimal places (milligram precision),
//! money at 2 decimal places. Form input is parsed leniently: anything that is not
//! a number counts as zero.

use bigdecimal::{BigDecimal, RoundingMode};
use std::str::FromStr;

/// Decimal places used for weights (grams)
pub const WEIGHT_SCALE: i64 = 3;

/// Decimal places used for money (rupees)
pub const MONEY_SCALE: i64 = 2;

/// Longest plain decimal accepted from a form field
pub const MAX_INPUT_LEN: usize = 32;

/// Parse a plain decimal such as `-12.345`.
///
/// Exponent notation and input longer than [`MAX_INPUT_LEN`] are refused; the scale of
/// every accepted value stays small enough for rounding to be cheap.
pub fn parse_decimal_strict(input: &str) -> Option<BigDecimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_INPUT_LEN {
        return None;
    }
    let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    BigDecimal::from_str(trimmed).ok()
}

/// Parse a user-entered number, treating blank or malformed input as zero
pub fn parse_decimal_lenient(input: &str) -> BigDecimal {
    parse_decimal_strict(input).unwrap_or_else(|| BigDecimal::from(0))
}

/// Same as [`parse_decimal_lenient`] for optional form fields
pub fn parse_optional_lenient(input: Option<&str>) -> BigDecimal {
    input
        .map(parse_decimal_lenient)
        .unwrap_or_else(|| BigDecimal::from(0))
}

/// Parse a whole count (pieces). Fractions are truncated, negatives and garbage become zero.
pub fn parse_count_lenient(input: Option<&str>) -> u32 {
    let Some(raw) = input else {
        return 0;
    };
    let trimmed = raw.trim();
    if let Ok(count) = trimmed.parse::<u32>() {
        return count;
    }
    let value = parse_decimal_lenient(trimmed);
    if value <= BigDecimal::from(0) {
        return 0;
    }
    value
        .with_scale_round(0, RoundingMode::Down)
        .to_string()
        .parse::<u32>()
        .unwrap_or(0)
}

/// Round a weight to milligram precision
pub fn round_weight(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(WEIGHT_SCALE, RoundingMode::HalfUp)
}

/// Round an amount to paise precision
pub fn round_money(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp)
}

/// Render a weight with exactly 3 decimals, e.g. `9.500`
pub fn format_weight(value: &BigDecimal) -> String {
    round_weight(value).to_string()
}

/// Render an amount with exactly 2 decimals, e.g. `48400.00`
pub fn format_money(value: &BigDecimal) -> String {
    round_money(value).to_string()
}
