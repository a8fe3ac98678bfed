//! Sales screen: cart building and order checkout.
//!
//! # Responsibility
//! - Hold the cart, the selected client and the payment method.
//! - Commit an order with its items, stock decrements and the client's
//!   credit charge as one unit of work.
//!
//! # Invariants
//! - Order total equals the sum of `quantity * unit_price` over its items.
//! - A client's balance grows only when the payment method is credit.
//! - Screen state is reset only after a successful commit; a failed
//!   checkout leaves cart, client and payment method untouched.

use super::{fail, ServiceError, ServiceResult};
use crate::messaging::{AppMessage, MessageBus};
use crate::model::client::Client;
use crate::model::order::{NewOrder, NewOrderItem, PaymentMethod};
use crate::model::product::Product;
use crate::model::stock::{MovementType, NewStockMovement};
use crate::model::RecordId;
use crate::repo::client_repo::SqliteClientRepository;
use crate::repo::order_repo::{InsertedOrder, OrderRepository, SqliteOrderRepository};
use crate::repo::product_repo::SqliteProductRepository;
use crate::repo::stock_repo::{SqliteStockMovementRepository, StockMovementRepository};
use crate::repo::Repository;
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;

pub const EMPTY_CART_MESSAGE: &str = "Add at least one product to the cart.";
pub const CREDIT_REQUIRES_CLIENT_MESSAGE: &str = "Select a client for credit orders.";

const MODULE: &str = "sales";

/// One cart line. The unit price is frozen when the product is added.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product_id: RecordId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl CartItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

pub struct SalesService {
    bus: MessageBus,
    products: Vec<Product>,
    clients: Vec<Client>,
    cart: Vec<CartItem>,
    selected_client: Option<Client>,
    payment_method: PaymentMethod,
}

impl SalesService {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            products: Vec::new(),
            clients: Vec::new(),
            cart: Vec::new(),
            selected_client: None,
            payment_method: PaymentMethod::default(),
        }
    }

    /// Reloads the product and client pickers.
    ///
    /// A selected client that is no longer active is cleared.
    pub fn load(&mut self, conn: &Connection) -> ServiceResult<()> {
        let loaded = SqliteProductRepository::new(conn)
            .list_active()
            .and_then(|products| {
                SqliteClientRepository::new(conn)
                    .list_active()
                    .map(|clients| (products, clients))
            });
        let (products, clients) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => return fail(&self.bus, MODULE, "load sales data", err),
        };

        self.products = products;
        self.selected_client = self.selected_client.take().and_then(|selected| {
            clients
                .iter()
                .find(|client| client.id == selected.id)
                .cloned()
        });
        self.clients = clients;
        Ok(())
    }

    /// Reloads on catalog or client changes. Returns whether it reloaded.
    pub fn handle_message(
        &mut self,
        conn: &Connection,
        message: &AppMessage,
    ) -> ServiceResult<bool> {
        match message {
            AppMessage::ProductsChanged | AppMessage::ClientsChanged => {
                self.load(conn)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Adds one unit of `product` at its current price.
    ///
    /// Returns `false` when the product is already in the cart; quantities
    /// change through [`Self::increase_quantity`].
    pub fn add_product(&mut self, product: &Product) -> bool {
        if self.cart.iter().any(|item| item.product_id == product.id) {
            return false;
        }
        self.cart.push(CartItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: 1,
            unit_price: product.price,
        });
        true
    }

    /// Adds a loaded product by id. Returns `false` if unknown or already in the cart.
    pub fn add_product_by_id(&mut self, product_id: RecordId) -> bool {
        match self.products.iter().find(|product| product.id == product_id) {
            Some(product) => {
                let product = product.clone();
                self.add_product(&product)
            }
            None => false,
        }
    }

    pub fn increase_quantity(&mut self, product_id: RecordId) {
        if let Some(item) = self.cart.iter_mut().find(|item| item.product_id == product_id) {
            item.quantity = item.quantity.saturating_add(1);
        }
    }

    /// Removes one unit; the line is dropped when it reaches zero.
    pub fn decrease_quantity(&mut self, product_id: RecordId) {
        let Some(index) = self.cart.iter().position(|item| item.product_id == product_id) else {
            return;
        };
        if self.cart[index].quantity > 1 {
            self.cart[index].quantity -= 1;
        } else {
            self.cart.remove(index);
        }
    }

    pub fn remove_item(&mut self, product_id: RecordId) {
        self.cart.retain(|item| item.product_id != product_id);
    }

    pub fn total_amount(&self) -> Decimal {
        self.cart.iter().map(CartItem::subtotal).sum()
    }

    pub fn total_quantity(&self) -> u32 {
        self.cart.iter().map(|item| item.quantity).sum()
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.selected_client.as_ref()
    }

    /// Selects a loaded client by id, or clears the selection with `None`.
    pub fn select_client(&mut self, client_id: Option<RecordId>) {
        self.selected_client = client_id.and_then(|id| {
            self.clients
                .iter()
                .find(|client| client.id == id)
                .cloned()
        });
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    pub fn can_finalize(&self) -> bool {
        !self.cart.is_empty()
    }

    /// Commits the cart as a new order.
    ///
    /// On success publishes `OrderCreated`, one `StockChanged` per product
    /// and a success status, then resets the screen. On failure publishes a
    /// failure status and keeps the cart.
    pub fn finalize(&mut self, conn: &mut Connection) -> ServiceResult<InsertedOrder> {
        if self.cart.is_empty() {
            return fail(
                &self.bus,
                MODULE,
                "finalize order",
                ServiceError::rejected(EMPTY_CART_MESSAGE),
            );
        }
        if self.payment_method.is_credit() && self.selected_client.is_none() {
            return fail(
                &self.bus,
                MODULE,
                "finalize order",
                ServiceError::rejected(CREDIT_REQUIRES_CLIENT_MESSAGE),
            );
        }

        let order = self.build_order();
        let inserted = match commit_order(conn, &order) {
            Ok(inserted) => inserted,
            Err(err) => {
                warn!(
                    "event=order_finalize module={MODULE} status=rolled_back items={} payment_method={}",
                    order.items.len(),
                    order.payment_method.code()
                );
                return fail(&self.bus, MODULE, "finalize order", err);
            }
        };

        info!(
            "event=order_finalize module={MODULE} status=ok order_id={} items={} payment_method={} total={}",
            inserted.id,
            order.items.len(),
            order.payment_method.code(),
            inserted.total_amount
        );
        self.bus.publish(AppMessage::OrderCreated {
            order_id: inserted.id,
            total_amount: inserted.total_amount,
        });
        for item in &order.items {
            self.bus.publish(AppMessage::StockChanged {
                product_id: item.product_id,
            });
        }
        self.reset();
        self.bus
            .status_ok(format!("Order #{} completed successfully!", inserted.id));
        Ok(inserted)
    }

    /// Clears cart, client selection and payment method.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.selected_client = None;
        self.payment_method = PaymentMethod::default();
    }

    fn build_order(&self) -> NewOrder {
        NewOrder {
            client_id: self.selected_client.as_ref().map(|client| client.id),
            payment_method: self.payment_method,
            items: self
                .cart
                .iter()
                .map(|item| NewOrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}

/// Writes the order, its items, stock movements and the credit charge in one
/// IMMEDIATE transaction. Any error drops the transaction uncommitted.
fn commit_order(conn: &mut Connection, order: &NewOrder) -> ServiceResult<InsertedOrder> {
    order.validate()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let inserted = {
        let products = SqliteProductRepository::new(&tx);
        let clients = SqliteClientRepository::new(&tx);
        let movements = SqliteStockMovementRepository::new(&tx);

        if let Some(client_id) = order.client_id {
            let client = clients.get_by_id(client_id)?.ok_or(ServiceError::NotFound {
                entity: "client",
                id: client_id,
            })?;
            if !client.is_active {
                return Err(ServiceError::rejected(format!(
                    "Client {} is no longer active.",
                    client.name
                )));
            }
        }
        for item in &order.items {
            let product = products.get_by_id(item.product_id)?.ok_or(ServiceError::NotFound {
                entity: "product",
                id: item.product_id,
            })?;
            if !product.is_active {
                return Err(ServiceError::rejected(format!(
                    "Product {} is no longer available.",
                    product.name
                )));
            }
        }

        let inserted = SqliteOrderRepository::new(&tx).insert_order(order)?;

        if order.payment_method.is_credit() {
            if let Some(client_id) = order.client_id {
                clients.adjust_balance(client_id, inserted.total_amount)?;
            }
        }

        let reason = format!("Order #{}", inserted.id);
        for item in &order.items {
            let quantity = f64::from(item.quantity);
            products.adjust_stock(item.product_id, MovementType::Sale.stock_delta(quantity))?;
            movements.record_movement(&NewStockMovement {
                product_id: item.product_id,
                kind: MovementType::Sale,
                quantity,
                reason: Some(reason.clone()),
            })?;
        }
        inserted
    };
    tx.commit()?;
    Ok(inserted)
}
