//! Rupiah amounts: rounding and form-input parsing.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Decimal places stored for money columns.
pub const MONEY_SCALE: u32 = 2;

/// Errors from parsing user-entered amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    /// Input had no digits after stripping formatting.
    #[error("amount is empty")]
    Empty,

    /// Input contained characters that are not part of a rupiah amount.
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// Rounds to two decimal places using banker's rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Rounds to whole rupiah using banker's rounding.
#[must_use]
pub fn round_rupiah(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// Parses a rupiah amount as typed into a form, e.g. `"Rp 1.200.000"`.
///
/// The `Rp` prefix, thousands separators (`.` and `,`) and whitespace are
/// stripped; what remains must be digits.
///
/// # Errors
///
/// Returns `MoneyParseError` if nothing numeric remains or stray characters
/// are present.
pub fn parse_rupiah(raw: &str) -> Result<Decimal, MoneyParseError> {
    let stripped = raw.trim();
    let stripped = stripped
        .strip_prefix("Rp")
        .or_else(|| stripped.strip_prefix("rp"))
        .or_else(|| stripped.strip_prefix("RP"))
        .unwrap_or(stripped);

    let digits: String = stripped
        .chars()
        .filter(|c| !matches!(c, '.' | ',') && !c.is_whitespace())
        .collect();

    if digits.is_empty() {
        return Err(MoneyParseError::Empty);
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(MoneyParseError::Invalid(raw.to_string()));
    }

    digits
        .parse::<Decimal>()
        .map_err(|_| MoneyParseError::Invalid(raw.to_string()))
}

/// Parses a percentage, accepting a comma decimal separator (`"2,5"`).
///
/// Blank input means "no rate" and yields `Ok(None)`. A trailing `%` is allowed.
///
/// # Errors
///
/// Returns `MoneyParseError::Invalid` if the input is not a decimal number.
pub fn parse_percent(raw: &str) -> Result<Option<Decimal>, MoneyParseError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .replace(',', ".")
        .parse::<Decimal>()
        .map(Some)
        .map_err(|_| MoneyParseError::Invalid(raw.to_string()))
}
