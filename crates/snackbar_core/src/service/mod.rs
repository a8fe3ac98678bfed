//! Screen-level use-case services.
//!
//! # Responsibility
//! - Hold the explicit state of each screen (loaded lists, filters, cart).
//! - Orchestrate repository calls, including multi-table transactions.
//! - Report every user-triggered outcome on the `MessageBus`.
//!
//! # Invariants
//! - A failed operation leaves screen state unchanged and publishes a
//!   failure `StatusMessage`.
//! - Transactions are committed only after every write succeeded; any early
//!   return drops the transaction, which rolls it back.

pub mod catalog_service;
pub mod client_service;
pub mod inventory_service;
pub mod order_status_service;
pub mod payment_service;
pub mod sales_service;

use crate::messaging::MessageBus;
use crate::model::{RecordId, ValidationError};
use crate::repo::RepoError;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Field-level validation failed.
    Validation(ValidationError),
    /// Business rule refused the operation; the text is user-facing.
    Rejected(String),
    NotFound { entity: &'static str, id: RecordId },
    Repo(RepoError),
}

impl ServiceError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Message shown to the user for a failed `action` (e.g. "save product").
    pub fn user_message(&self, action: &str) -> String {
        match self {
            Self::Repo(err) => format!("Failed to {action}: {err}"),
            other => other.to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Rejected(message) => f.write_str(message),
            Self::NotFound { entity, id } => write!(f, "{entity} #{id} not found."),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Rejected(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Publishes the failure on the bus, logs it, and returns it as `Err`.
pub(crate) fn fail<T>(
    bus: &MessageBus,
    module: &str,
    action: &str,
    err: impl Into<ServiceError>,
) -> ServiceResult<T> {
    let err = err.into();
    warn!(
        "event=screen_action module={module} status=error action=\"{action}\" error={err}"
    );
    bus.status_err(err.user_message(action));
    Err(err)
}

/// Case-insensitive substring match. A blank needle matches everything.
pub fn matches_search(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
