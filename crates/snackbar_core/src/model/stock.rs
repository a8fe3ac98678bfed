//! Stock movement ledger entries.

use super::{RecordId, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Manual stock entry (delivery, correction up).
    Input,
    /// Manual stock exit (waste, correction down).
    Output,
    /// Automatic decrement recorded by checkout.
    Sale,
}

impl MovementType {
    pub fn code(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Sale => "sale",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "input" => Some(Self::Input),
            "output" => Some(Self::Output),
            "sale" => Some(Self::Sale),
            _ => None,
        }
    }

    /// Sign applied to a product's stock for this movement kind.
    pub fn stock_delta(self, quantity: f64) -> f64 {
        match self {
            Self::Input => quantity,
            Self::Output | Self::Sale => -quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: RecordId,
    pub product_id: RecordId,
    pub kind: MovementType,
    /// Always positive; direction comes from `kind`.
    pub quantity: f64,
    /// Unix epoch milliseconds.
    pub date: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStockMovement {
    pub product_id: RecordId,
    pub kind: MovementType,
    pub quantity: f64,
    pub reason: Option<String>,
}

impl NewStockMovement {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.quantity.is_finite() {
            return Err(ValidationError::NotFinite("Movement quantity"));
        }
        if self.quantity <= 0.0 {
            return Err(ValidationError::ZeroQuantity);
        }
        Ok(())
    }
}
