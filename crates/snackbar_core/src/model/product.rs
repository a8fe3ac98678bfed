//! Catalog product record.

use super::money::validate_amount;
use super::{require_text, RecordId, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sellable catalog item with its stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub is_combo: bool,
    pub description: Option<String>,
    /// Soft-delete marker. Inactive products stay referenced by old orders.
    pub is_active: bool,
    pub stock_quantity: f64,
    /// Stock at or below this level is reported as low.
    pub min_stock_level: f64,
}

impl Product {
    pub const DEFAULT_CATEGORY: &'static str = "Geral";
    pub const DEFAULT_MIN_STOCK_LEVEL: f64 = 5.0;

    /// Creates an unsaved, active product with default category and threshold.
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: 0,
            name: name.into(),
            category: Self::DEFAULT_CATEGORY.to_string(),
            price,
            is_combo: false,
            description: None,
            is_active: true,
            stock_quantity: 0.0,
            min_stock_level: Self::DEFAULT_MIN_STOCK_LEVEL,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, "Product name")?;
        require_text(&self.category, "Category")?;
        validate_amount(self.price, "Price")?;
        if !self.stock_quantity.is_finite() {
            return Err(ValidationError::NotFinite("Stock quantity"));
        }
        if !self.min_stock_level.is_finite() {
            return Err(ValidationError::NotFinite("Minimum stock level"));
        }
        if self.min_stock_level < 0.0 {
            return Err(ValidationError::Negative("Minimum stock level"));
        }
        Ok(())
    }
}
