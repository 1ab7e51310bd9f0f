// 📐 Validation - field constraints enforced before an entry is stored
// Pure functions: no I/O, deterministic for the same inputs.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::entry::{Kind, NewEntry};
use crate::error::ValidationError;

// ============================================================================
// FIELD CHECKS
// ============================================================================

/// Validate the caller-supplied fields of a new entry.
///
/// Checks run in a fixed order (amount, then category) so the same bad input
/// always yields the same error.
pub fn validate(_kind: Kind, amount: Decimal, category: &str) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount);
    }

    if category.trim().is_empty() {
        return Err(ValidationError::InvalidCategory);
    }

    Ok(())
}

pub fn validate_new_entry(entry: &NewEntry) -> Result<(), ValidationError> {
    validate(entry.kind, entry.amount, &entry.category)
}

// ============================================================================
// RAW INPUT PARSING
// ============================================================================

/// Parse a kind coming from untyped input (CLI argument, JSON string).
pub fn parse_kind(raw: &str) -> Result<Kind, ValidationError> {
    Kind::from_str(raw)
}

/// Checked parsing of a textual amount such as `"12.50"` or `"1e3"`.
pub fn parse_amount_str(raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();

    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::InvalidAmount)?;

    positive(amount)
}

/// Checked conversion of a floating point amount (JSON number).
///
/// NaN and infinities are rejected. The value goes through its shortest
/// decimal rendering so `0.1` becomes exactly `0.1`, not the nearest binary
/// fraction.
pub fn parse_amount_f64(raw: f64) -> Result<Decimal, ValidationError> {
    if !raw.is_finite() {
        return Err(ValidationError::InvalidAmount);
    }

    let amount = Decimal::from_str(&raw.to_string()).map_err(|_| ValidationError::InvalidAmount)?;
    positive(amount)
}

fn positive(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        Err(ValidationError::InvalidAmount)
    } else {
        Ok(amount.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_accepts_valid_input() {
        assert_eq!(validate(Kind::Expense, dec!(0.01), "food"), Ok(()));
        assert_eq!(validate(Kind::Income, dec!(2500), "  salary "), Ok(()));
    }

    #[test]
    fn test_validate_rejects_non_positive_amounts() {
        assert_eq!(
            validate(Kind::Expense, Decimal::ZERO, "food"),
            Err(ValidationError::InvalidAmount)
        );
        assert_eq!(
            validate(Kind::Expense, dec!(-5), "food"),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn test_validate_rejects_blank_category() {
        assert_eq!(validate(Kind::Income, dec!(1), ""), Err(ValidationError::InvalidCategory));
        assert_eq!(
            validate(Kind::Income, dec!(1), " \t\n"),
            Err(ValidationError::InvalidCategory)
        );
    }

    #[test]
    fn test_amount_checked_before_category() {
        assert_eq!(validate(Kind::Income, dec!(0), " "), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn test_parse_amount_str() {
        assert_eq!(parse_amount_str("12.50"), Ok(dec!(12.5)));
        assert_eq!(parse_amount_str(" 7 "), Ok(dec!(7)));
        assert_eq!(parse_amount_str("1e3"), Ok(dec!(1000)));
        assert_eq!(parse_amount_str("0"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount_str("-3"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount_str("abc"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount_str("NaN"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount_str(""), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn test_parse_amount_f64() {
        assert_eq!(parse_amount_f64(0.1), Ok(dec!(0.1)));
        assert_eq!(parse_amount_f64(19.99), Ok(dec!(19.99)));
        assert_eq!(parse_amount_f64(f64::NAN), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount_f64(f64::INFINITY), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount_f64(f64::NEG_INFINITY), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount_f64(0.0), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount_f64(-0.5), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("expense"), Ok(Kind::Expense));
        assert_eq!(parse_kind("refund"), Err(ValidationError::InvalidKind));
    }
}
