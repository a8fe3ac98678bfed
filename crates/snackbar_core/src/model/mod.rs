//! Domain model for the snack bar catalog, client tabs, orders and stock.
//!
//! # Responsibility
//! - Define the records shared by repositories and screen services.
//! - Own field-level validation rules applied before every write.
//!
//! # Invariants
//! - Products and clients are never hard-deleted by services; `is_active`
//!   is the soft-delete marker that keeps order history resolvable.
//! - Money is carried as `Decimal` with at most two fractional digits.

pub mod client;
pub mod money;
pub mod order;
pub mod product;
pub mod stock;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row identifier assigned by SQLite. `0` marks a record not yet persisted.
pub type RecordId = i64;

/// Field-level validation failure with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is blank after trimming.
    Required(&'static str),
    /// Field exceeds its maximum length in characters.
    TooLong { field: &'static str, max: usize },
    /// Numeric field is below zero.
    Negative(&'static str),
    /// Money field has more than two fractional digits.
    TooPrecise(&'static str),
    /// Money field is too large to store.
    OutOfRange(&'static str),
    /// Quantity field is NaN or infinite.
    NotFinite(&'static str),
    /// Field does not match its expected format.
    InvalidFormat(&'static str),
    /// Quantity must be at least one unit.
    ZeroQuantity,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required(field) => write!(f, "{field} is required."),
            Self::TooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters.")
            }
            Self::Negative(field) => write!(f, "{field} cannot be negative."),
            Self::TooPrecise(field) => {
                write!(f, "{field} must have at most two decimal places.")
            }
            Self::OutOfRange(field) => write!(f, "{field} is too large."),
            Self::NotFinite(field) => write!(f, "{field} must be a finite number."),
            Self::InvalidFormat(field) => write!(f, "{field} has an invalid format."),
            Self::ZeroQuantity => write!(f, "Quantity must be at least 1."),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

pub(crate) fn limit_length(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
