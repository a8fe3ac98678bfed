//! Money helpers: conversion between `Decimal` amounts and stored cents.

use super::ValidationError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const CENTS_SCALE: u32 = 2;

/// Converts stored integer cents back to a two-place decimal amount.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, CENTS_SCALE)
}

/// Converts an amount to integer cents.
///
/// Fails with `TooPrecise` when the amount has more than two fractional
/// digits and with `OutOfRange` when it does not fit in `i64` cents.
pub fn to_cents(amount: Decimal, field: &'static str) -> Result<i64, ValidationError> {
    if amount.normalize().scale() > CENTS_SCALE {
        return Err(ValidationError::TooPrecise(field));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or(ValidationError::OutOfRange(field))
}

/// Validates a non-negative money field that converts to stored cents.
pub fn validate_amount(amount: Decimal, field: &'static str) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::Negative(field));
    }
    to_cents(amount, field).map(|_| ())
}
