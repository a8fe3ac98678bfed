//! Stock movement ledger persistence.

use super::{RepoError, RepoResult};
use crate::model::stock::{MovementType, NewStockMovement, StockMovement};
use crate::model::RecordId;
use rusqlite::{params, Connection};

pub trait StockMovementRepository {
    fn record_movement(&self, movement: &NewStockMovement) -> RepoResult<RecordId>;
    /// Movements of one product, newest first.
    fn list_for_product(&self, product_id: RecordId) -> RepoResult<Vec<StockMovement>>;
}

pub struct SqliteStockMovementRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStockMovementRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StockMovementRepository for SqliteStockMovementRepository<'_> {
    fn record_movement(&self, movement: &NewStockMovement) -> RepoResult<RecordId> {
        movement.validate()?;
        self.conn.execute(
            "INSERT INTO stock_movements (product_id, kind, quantity, reason)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                movement.product_id,
                movement.kind.code(),
                movement.quantity,
                movement.reason.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_for_product(&self, product_id: RecordId) -> RepoResult<Vec<StockMovement>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_id, kind, quantity, date, reason
             FROM stock_movements
             WHERE product_id = ?1
             ORDER BY date DESC, id DESC;",
        )?;
        let mut rows = stmt.query([product_id])?;
        let mut movements = Vec::new();
        while let Some(row) = rows.next()? {
            let kind_text: String = row.get("kind")?;
            let kind = MovementType::from_code(&kind_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid movement kind `{kind_text}` in stock_movements.kind"
                ))
            })?;
            movements.push(StockMovement {
                id: row.get("id")?,
                product_id: row.get("product_id")?,
                kind,
                quantity: row.get("quantity")?,
                date: row.get("date")?,
                reason: row.get("reason")?,
            });
        }
        Ok(movements)
    }
}
