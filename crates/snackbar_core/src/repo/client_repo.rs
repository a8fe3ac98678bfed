//! Client table mapping and tab (outstanding balance) queries.

use super::generic_repo::{SqliteRecord, SqliteRepository};
use super::{amount_to_cents, bool_to_int, parse_bool, RepoResult};
use crate::model::client::Client;
use crate::model::money::from_cents;
use crate::model::{RecordId, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params, Row};
use rust_decimal::Decimal;

pub type SqliteClientRepository<'conn> = SqliteRepository<'conn, Client>;

impl SqliteRecord for Client {
    const ENTITY: &'static str = "client";
    const TABLE: &'static str = "clients";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "phone",
        "observations",
        "outstanding_balance_cents",
        "is_active",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Client::validate(self)
    }

    fn bind_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Text(self.name.trim().to_string()),
            optional_text(self.phone.as_deref()),
            optional_text(self.observations.as_deref()),
            Value::Integer(amount_to_cents(
                self.outstanding_balance,
                "Outstanding balance",
            )?),
            Value::Integer(bool_to_int(self.is_active)),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            phone: row.get("phone")?,
            observations: row.get("observations")?,
            outstanding_balance: from_cents(row.get("outstanding_balance_cents")?),
            is_active: parse_bool(row.get("is_active")?, "clients.is_active")?,
        })
    }
}

impl SqliteRepository<'_, Client> {
    pub fn list_active(&self) -> RepoResult<Vec<Client>> {
        self.query_where("WHERE is_active = 1 ORDER BY name COLLATE NOCASE ASC, id ASC", [])
    }

    /// Active clients with an open tab, largest balance first.
    pub fn list_debtors(&self) -> RepoResult<Vec<Client>> {
        self.query_where(
            "WHERE is_active = 1 AND outstanding_balance_cents > 0
             ORDER BY outstanding_balance_cents DESC, id ASC",
            [],
        )
    }

    /// Soft-deletes or restores a client.
    pub fn set_active(&self, id: RecordId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE clients SET is_active = ?1 WHERE id = ?2;",
            params![bool_to_int(is_active), id],
        )?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    /// Adds `delta` (may be negative) to the client's outstanding balance.
    ///
    /// The table's CHECK constraint rejects any change that would leave the
    /// balance below zero.
    pub fn adjust_balance(&self, id: RecordId, delta: Decimal) -> RepoResult<()> {
        let delta_cents = amount_to_cents(delta.abs(), "Balance adjustment")?;
        let signed_cents = if delta < Decimal::ZERO {
            -delta_cents
        } else {
            delta_cents
        };
        let changed = self.conn.execute(
            "UPDATE clients
             SET outstanding_balance_cents = outstanding_balance_cents + ?1
             WHERE id = ?2;",
            params![signed_cents, id],
        )?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map_or(Value::Null, |text| Value::Text(text.to_string()))
}
