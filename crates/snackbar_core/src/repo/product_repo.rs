//! Product table mapping and catalog/stock queries.

use super::generic_repo::{SqliteRecord, SqliteRepository};
use super::{amount_to_cents, bool_to_int, parse_bool, RepoResult};
use crate::model::money::from_cents;
use crate::model::product::Product;
use crate::model::{RecordId, ValidationError};
use rusqlite::types::Value;
use rusqlite::{params, Row};

pub type SqliteProductRepository<'conn> = SqliteRepository<'conn, Product>;

impl SqliteRecord for Product {
    const ENTITY: &'static str = "product";
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "category",
        "price_cents",
        "is_combo",
        "description",
        "is_active",
        "stock_quantity",
        "min_stock_level",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Product::validate(self)
    }

    fn bind_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Text(self.name.trim().to_string()),
            Value::Text(self.category.trim().to_string()),
            Value::Integer(amount_to_cents(self.price, "Price")?),
            Value::Integer(bool_to_int(self.is_combo)),
            self.description
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map_or(Value::Null, |text| Value::Text(text.to_string())),
            Value::Integer(bool_to_int(self.is_active)),
            Value::Real(self.stock_quantity),
            Value::Real(self.min_stock_level),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            category: row.get("category")?,
            price: from_cents(row.get("price_cents")?),
            is_combo: parse_bool(row.get("is_combo")?, "products.is_combo")?,
            description: row.get("description")?,
            is_active: parse_bool(row.get("is_active")?, "products.is_active")?,
            stock_quantity: row.get("stock_quantity")?,
            min_stock_level: row.get("min_stock_level")?,
        })
    }
}

impl SqliteRepository<'_, Product> {
    /// Active products ordered by name, as shown on sales and catalog screens.
    pub fn list_active(&self) -> RepoResult<Vec<Product>> {
        self.query_where("WHERE is_active = 1 ORDER BY name COLLATE NOCASE ASC, id ASC", [])
    }

    /// Active products at or below their minimum stock level, lowest stock first.
    pub fn list_low_stock(&self) -> RepoResult<Vec<Product>> {
        self.query_where(
            "WHERE is_active = 1 AND stock_quantity <= min_stock_level
             ORDER BY stock_quantity ASC, id ASC",
            [],
        )
    }

    /// Soft-deletes or restores a product.
    pub fn set_active(&self, id: RecordId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE products SET is_active = ?1 WHERE id = ?2;",
            params![bool_to_int(is_active), id],
        )?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    /// Adds `delta` (may be negative) to the product's stock on hand.
    pub fn adjust_stock(&self, id: RecordId, delta: f64) -> RepoResult<()> {
        if !delta.is_finite() {
            return Err(ValidationError::NotFinite("Stock adjustment").into());
        }
        let changed = self.conn.execute(
            "UPDATE products SET stock_quantity = stock_quantity + ?1 WHERE id = ?2;",
            params![delta, id],
        )?;
        if changed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}
