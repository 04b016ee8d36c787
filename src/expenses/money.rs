//! Conversion between caller-facing decimal amounts and stored integer cents.
//!
//! Amounts cross this boundary exactly once in each direction; nothing past
//! the DTO layer ever holds a floating-point amount.

use crate::error::AppError;

pub const CENTS_PER_UNIT: i64 = 100;

/// `round(amount * 100)`, rejecting negative, non-finite and overflowing input.
pub fn to_cents(amount: f64) -> Result<i64, AppError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::InvalidAmount);
    }
    let cents = (amount * CENTS_PER_UNIT as f64).round();
    if cents >= i64::MAX as f64 {
        return Err(AppError::InvalidAmount);
    }
    Ok(cents as i64)
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / CENTS_PER_UNIT as f64
}
