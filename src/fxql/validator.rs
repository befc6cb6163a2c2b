//! Field-level checks shared by the statement parser.
//!
//! Each check returns the validated value, so callers never hold an
//! unchecked number.

use std::borrow::Cow;

use super::error::{FxqlError, Position};
use crate::domain::{Currency, Decimal};

/// Parses a numeric literal such as `0.85`, `.5` or `10000`.
fn parse_number(raw: &str) -> Option<Decimal> {
    let literal = match raw.strip_prefix('.') {
        Some(fraction) => Cow::Owned(format!("0.{fraction}")),
        None => Cow::Borrowed(raw),
    };
    Decimal::from_str_canonical(&literal).ok()
}

/// Checks the casing of `source` and that both codes are whitelisted.
///
/// Only the source code's casing is inspected; a lower-case destination is
/// reported by the whitelist check instead.
pub fn validate_currency_pair(
    source: &str,
    destination: &str,
    line: usize,
    column: usize,
) -> Result<(Currency, Currency), FxqlError> {
    let expected = source.to_uppercase();
    if source.is_empty() || source != expected {
        return Err(FxqlError::currency(
            format!(
                "Invalid currency case: '{}' should be '{}'",
                source, expected
            ),
            Position::at(line, column),
        ));
    }

    match (source.parse::<Currency>(), destination.parse::<Currency>()) {
        (Ok(source), Ok(destination)) => Ok((source, destination)),
        _ => Err(FxqlError::currency(
            format!("Invalid currency pair: {}-{}", source, destination),
            Position::at(line, column),
        )),
    }
}

/// Parses a BUY/SELL price, which must be strictly positive.
pub fn validate_amount(raw: &str, line: usize, column: usize) -> Result<Decimal, FxqlError> {
    let amount = parse_number(raw).ok_or_else(|| {
        FxqlError::amount(
            format!("Invalid amount: '{}' is not a valid numeric amount", raw),
            Position::at(line, column),
        )
    })?;

    if !amount.is_positive() {
        return Err(FxqlError::amount(
            format!("Invalid amount: {} must be greater than 0", amount),
            Position::at(line, column),
        ));
    }

    Ok(amount)
}

/// Parses a CAP value, which must be a non-negative integer. Zero is allowed.
pub fn validate_cap(raw: &str, line: usize, column: usize) -> Result<i64, FxqlError> {
    let invalid = || {
        FxqlError::cap(
            format!("Invalid cap: {} should be a non-negative integer", raw),
            Position::at(line, column),
        )
    };

    let cap = parse_number(raw).ok_or_else(invalid)?;
    if cap.is_negative() {
        return Err(invalid());
    }
    cap.to_i64().ok_or_else(invalid)
}
