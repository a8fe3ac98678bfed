//! Generic CRUD repository over SQLite tables.
//!
//! One implementation serves every record type that describes its own
//! table through `SqliteRecord`.

use super::{RepoError, RepoResult};
use crate::model::{RecordId, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::marker::PhantomData;

/// CRUD passthrough contract used by screen services.
pub trait Repository<T> {
    /// Inserts a new record and returns its assigned id. `entity.id` is ignored.
    fn add(&self, entity: &T) -> RepoResult<RecordId>;
    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<T>>;
    /// Lists every row, active or not, in id order.
    fn get_all(&self) -> RepoResult<Vec<T>>;
    fn update(&self, entity: &T) -> RepoResult<()>;
    /// Hard delete. Fails with a foreign-key error when history references the row.
    fn delete(&self, id: RecordId) -> RepoResult<()>;
}

/// Table mapping for a record persisted by `SqliteRepository`.
pub trait SqliteRecord: Sized {
    /// Entity label used in not-found errors.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    /// Data columns, excluding `id`, in `bind_values` order.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> RecordId;
    fn validate(&self) -> Result<(), ValidationError>;
    fn bind_values(&self) -> RepoResult<Vec<Value>>;
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// SQLite-backed generic repository borrowing a connection or transaction.
pub struct SqliteRepository<'conn, T> {
    pub(crate) conn: &'conn Connection,
    _record: PhantomData<fn() -> T>,
}

impl<'conn, T: SqliteRecord> SqliteRepository<'conn, T> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    pub(crate) fn select_sql() -> String {
        format!("SELECT id, {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
    }

    /// Runs a `SELECT` built from `select_sql()` plus a trailing clause.
    pub(crate) fn query_where(
        &self,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} {clause};", Self::select_sql()))?;
        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(T::from_row(row)?);
        }
        Ok(records)
    }

    pub(crate) fn not_found(id: RecordId) -> RepoError {
        RepoError::NotFound {
            entity: T::ENTITY,
            id,
        }
    }
}

impl<T: SqliteRecord> Repository<T> for SqliteRepository<'_, T> {
    fn add(&self, entity: &T) -> RepoResult<RecordId> {
        entity.validate()?;

        let placeholders = (1..=T::COLUMNS.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({placeholders});",
                T::TABLE,
                T::COLUMNS.join(", ")
            ),
            params_from_iter(entity.bind_values()?),
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<T>> {
        Ok(self.query_where("WHERE id = ?1", [id])?.into_iter().next())
    }

    fn get_all(&self) -> RepoResult<Vec<T>> {
        self.query_where("ORDER BY id ASC", [])
    }

    fn update(&self, entity: &T) -> RepoResult<()> {
        entity.validate()?;

        let assignments = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values = entity.bind_values()?;
        values.push(Value::Integer(entity.id()));

        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET {assignments} WHERE id = ?{};",
                T::TABLE,
                T::COLUMNS.len() + 1
            ),
            params_from_iter(values),
        )?;

        if changed == 0 {
            return Err(Self::not_found(entity.id()));
        }
        Ok(())
    }

    fn delete(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1;", T::TABLE), [id])?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}
