//! Inventory screen: stock levels, manual adjustments and movement history.
//!
//! # Invariants
//! - Every stock change writes a `stock_movements` row in the same
//!   transaction as the product update.
//! - Manual exits may take stock below zero; counts are corrected by a
//!   later manual entry rather than blocked at the counter.

use super::{fail, matches_search, ServiceError, ServiceResult};
use crate::messaging::{AppMessage, MessageBus};
use crate::model::product::Product;
use crate::model::stock::{MovementType, NewStockMovement, StockMovement};
use crate::model::RecordId;
use crate::repo::product_repo::SqliteProductRepository;
use crate::repo::stock_repo::{SqliteStockMovementRepository, StockMovementRepository};
use crate::repo::Repository;
use log::info;
use rusqlite::{Connection, TransactionBehavior};

pub const MANUAL_ENTRY_REASON: &str = "Manual entry";
pub const MANUAL_EXIT_REASON: &str = "Manual exit";
pub const INVALID_ADJUSTMENT_MESSAGE: &str = "Quantity must be greater than zero.";

const MODULE: &str = "inventory";

pub struct InventoryService {
    bus: MessageBus,
    products: Vec<Product>,
    search_text: String,
}

impl InventoryService {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            products: Vec::new(),
            search_text: String::new(),
        }
    }

    pub fn load(&mut self, conn: &Connection) -> ServiceResult<()> {
        match SqliteProductRepository::new(conn).list_active() {
            Ok(products) => {
                self.products = products;
                Ok(())
            }
            Err(err) => fail(&self.bus, MODULE, "load inventory", err),
        }
    }

    /// Reloads when stock or the catalog may have changed.
    pub fn handle_message(
        &mut self,
        conn: &Connection,
        message: &AppMessage,
    ) -> ServiceResult<bool> {
        match message {
            AppMessage::ProductsChanged
            | AppMessage::StockChanged { .. }
            | AppMessage::OrderCreated { .. } => {
                self.load(conn)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    pub fn filtered(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| matches_search(&product.name, &self.search_text))
            .collect()
    }

    pub fn low_stock_products(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| product.is_low_stock())
            .collect()
    }

    /// True when any loaded product is at or below its minimum level.
    pub fn has_low_stock_warning(&self) -> bool {
        self.products.iter().any(Product::is_low_stock)
    }

    /// Adds `amount` to stock. Returns the new stock quantity.
    pub fn manual_entry(
        &mut self,
        conn: &mut Connection,
        product_id: RecordId,
        amount: f64,
    ) -> ServiceResult<f64> {
        self.adjust(conn, product_id, MovementType::Input, amount)
    }

    /// Removes `amount` from stock. Returns the new stock quantity.
    pub fn manual_exit(
        &mut self,
        conn: &mut Connection,
        product_id: RecordId,
        amount: f64,
    ) -> ServiceResult<f64> {
        self.adjust(conn, product_id, MovementType::Output, amount)
    }

    /// Movement history of one product, newest first.
    pub fn movements(
        &self,
        conn: &Connection,
        product_id: RecordId,
    ) -> ServiceResult<Vec<StockMovement>> {
        match SqliteStockMovementRepository::new(conn).list_for_product(product_id) {
            Ok(movements) => Ok(movements),
            Err(err) => fail(&self.bus, MODULE, "load stock movements", err),
        }
    }

    fn adjust(
        &mut self,
        conn: &mut Connection,
        product_id: RecordId,
        kind: MovementType,
        amount: f64,
    ) -> ServiceResult<f64> {
        let product = match record_adjustment(conn, product_id, kind, amount) {
            Ok(product) => product,
            Err(err) => return fail(&self.bus, MODULE, "update stock", err),
        };

        info!(
            "event=stock_adjust module={MODULE} status=ok product_id={product_id} kind={} quantity={amount} stock={}",
            kind.code(),
            product.stock_quantity
        );
        self.bus
            .status_ok(format!("Stock for {} updated successfully!", product.name));
        self.bus.publish(AppMessage::StockChanged { product_id });
        let _ = self.load(conn);
        Ok(product.stock_quantity)
    }
}

/// Applies a manual movement and returns the product with its new stock.
fn record_adjustment(
    conn: &mut Connection,
    product_id: RecordId,
    kind: MovementType,
    amount: f64,
) -> ServiceResult<Product> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ServiceError::rejected(INVALID_ADJUSTMENT_MESSAGE));
    }
    let reason = match kind {
        MovementType::Input => MANUAL_ENTRY_REASON,
        MovementType::Output | MovementType::Sale => MANUAL_EXIT_REASON,
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let product = {
        let products = SqliteProductRepository::new(&tx);
        let mut product = products
            .get_by_id(product_id)?
            .ok_or(ServiceError::NotFound {
                entity: "product",
                id: product_id,
            })?;
        let delta = kind.stock_delta(amount);
        products.adjust_stock(product_id, delta)?;
        SqliteStockMovementRepository::new(&tx).record_movement(&NewStockMovement {
            product_id,
            kind,
            quantity: amount,
            reason: Some(reason.to_string()),
        })?;
        product.stock_quantity += delta;
        product
    };
    tx.commit()?;
    Ok(product)
}
