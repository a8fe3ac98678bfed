//! Repository layer: data access contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide a generic CRUD facade (`Repository<T>`) for catalog records.
//! - Keep SQL, cents conversion and row parsing inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories never open transactions for callers that pass one in;
//!   they run on whatever `Connection` (or `Transaction`) they borrow.

pub mod client_repo;
pub mod generic_repo;
pub mod order_repo;
pub mod product_repo;
pub mod stock_repo;

use crate::db::DbError;
use crate::model::{RecordId, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use generic_repo::{Repository, SqliteRecord, SqliteRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: RecordId },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn amount_to_cents(
    amount: rust_decimal::Decimal,
    field: &'static str,
) -> RepoResult<i64> {
    crate::model::money::to_cents(amount, field).map_err(RepoError::Validation)
}
