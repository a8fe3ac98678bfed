//! Order, order item and the status/payment enums attached to them.

use super::money::validate_amount;
use super::{RecordId, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kitchen/counter lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InPreparation,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::InPreparation,
        Self::Ready,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Stable storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InPreparation => "in_preparation",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == value)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InPreparation => "In preparation",
            Self::Ready => "Ready",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Orders past the kitchen queue: ready, completed or cancelled.
    pub fn is_finalized(self) -> bool {
        matches!(self, Self::Ready | Self::Completed | Self::Cancelled)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How the customer settles the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// Split between cash and card.
    CashCard,
    MealVoucher,
    /// Deferred payment added to the client's tab.
    Credit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        Self::Cash,
        Self::Card,
        Self::CashCard,
        Self::MealVoucher,
        Self::Credit,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::CashCard => "cash_card",
            Self::MealVoucher => "meal_voucher",
            Self::Credit => "credit",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.code() == value)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Card => "Card",
            Self::CashCard => "Cash + card",
            Self::MealVoucher => "Meal voucher",
            Self::Credit => "Credit (tab)",
        }
    }

    pub fn is_credit(self) -> bool {
        self == Self::Credit
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One order line. `unit_price` is frozen at sale time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: RecordId,
    pub order_id: RecordId,
    pub product_id: RecordId,
    /// Read-model only; resolved from the products table.
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Persisted order with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: RecordId,
    /// Unix epoch milliseconds.
    pub order_date: i64,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub client_id: Option<RecordId>,
    /// Read-model only; resolved from the clients table.
    pub client_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub is_paid: bool,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(OrderItem::subtotal).sum()
    }
}

/// Line of an order about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: RecordId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl NewOrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        validate_amount(self.unit_price, "Unit price")
    }
}

/// Order about to be inserted. The stored total is always derived from items.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub client_id: Option<RecordId>,
    pub payment_method: PaymentMethod,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(NewOrderItem::subtotal).sum()
    }

    /// Credit orders stay unpaid until the client's tab is settled.
    pub fn is_paid_on_creation(&self) -> bool {
        !self.payment_method.is_credit()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::Required("Order items"));
        }
        if self.payment_method.is_credit() && self.client_id.is_none() {
            return Err(ValidationError::Required("Client for credit orders"));
        }
        self.items.iter().try_for_each(NewOrderItem::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::{NewOrder, NewOrderItem, OrderStatus, PaymentMethod};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn item(product_id: i64, quantity: u32, price: &str) -> NewOrderItem {
        NewOrderItem {
            product_id,
            quantity,
            unit_price: Decimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        let order = NewOrder {
            client_id: None,
            payment_method: PaymentMethod::Cash,
            items: vec![item(1, 2, "10.00"), item(2, 1, "5.00")],
        };
        assert_eq!(order.total_amount(), Decimal::from_str("25.00").unwrap());
        assert!(order.is_paid_on_creation());
    }

    #[test]
    fn status_codes_roundtrip_and_finalized_set() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert!(!OrderStatus::Pending.is_finalized());
        assert!(!OrderStatus::InPreparation.is_finalized());
        assert!(OrderStatus::Ready.is_finalized());
        assert!(OrderStatus::Cancelled.is_finalized());
        assert_eq!(OrderStatus::from_code("open"), None);
    }

    #[test]
    fn credit_order_without_client_fails_validation() {
        let order = NewOrder {
            client_id: None,
            payment_method: PaymentMethod::Credit,
            items: vec![item(1, 1, "3.50")],
        };
        assert!(order.validate().is_err());
        assert!(!order.is_paid_on_creation());
    }
}
