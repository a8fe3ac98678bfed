//! Order aggregate persistence: orders plus their items.
//!
//! # Invariants
//! - `total_amount_cents` is written as the sum of the inserted items.
//! - Listing is deterministic: newest `order_date` first, then highest id.

use super::{amount_to_cents, bool_to_int, parse_bool, RepoError, RepoResult};
use crate::model::money::from_cents;
use crate::model::order::{NewOrder, Order, OrderItem, OrderStatus, PaymentMethod};
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use rust_decimal::Decimal;

const ORDER_SELECT_SQL: &str = "SELECT
    o.id,
    o.order_date,
    o.total_amount_cents,
    o.status,
    o.client_id,
    c.name AS client_name,
    o.payment_method,
    o.is_paid
FROM orders o
LEFT JOIN clients c ON c.id = o.client_id";

const ITEM_SELECT_SQL: &str = "SELECT
    oi.id,
    oi.order_id,
    oi.product_id,
    p.name AS product_name,
    oi.quantity,
    oi.unit_price_cents
FROM order_items oi
LEFT JOIN products p ON p.id = oi.product_id
WHERE oi.order_id = ?1
ORDER BY oi.id ASC";

/// Filter options for listing orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    /// Only orders in one of these statuses. Empty means any status.
    pub statuses: Vec<OrderStatus>,
    pub client_id: Option<RecordId>,
    pub payment_method: Option<PaymentMethod>,
    /// `Some(false)` restricts to unpaid orders.
    pub is_paid: Option<bool>,
    pub limit: Option<u32>,
}

/// Identity and total of a freshly inserted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedOrder {
    pub id: RecordId,
    pub total_amount: Decimal,
}

pub trait OrderRepository {
    /// Inserts the order row and all item rows. Callers wrap this in a transaction.
    fn insert_order(&self, order: &NewOrder) -> RepoResult<InsertedOrder>;
    fn get_order(&self, id: RecordId) -> RepoResult<Option<Order>>;
    fn list_orders(&self, query: &OrderListQuery) -> RepoResult<Vec<Order>>;
    fn set_status(&self, id: RecordId, status: OrderStatus) -> RepoResult<()>;
    /// Marks every unpaid credit order of the client as paid; returns the count.
    fn mark_credit_orders_paid(&self, client_id: RecordId) -> RepoResult<usize>;
}

pub struct SqliteOrderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrderRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OrderRepository for SqliteOrderRepository<'_> {
    fn insert_order(&self, order: &NewOrder) -> RepoResult<InsertedOrder> {
        order.validate()?;

        let total_amount = order.total_amount();
        self.conn.execute(
            "INSERT INTO orders (
                total_amount_cents,
                status,
                client_id,
                payment_method,
                is_paid
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                amount_to_cents(total_amount, "Total amount")?,
                OrderStatus::Pending.code(),
                order.client_id,
                order.payment_method.code(),
                bool_to_int(order.is_paid_on_creation()),
            ],
        )?;
        let order_id = self.conn.last_insert_rowid();

        let mut stmt = self.conn.prepare(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents)
             VALUES (?1, ?2, ?3, ?4);",
        )?;
        for item in &order.items {
            stmt.execute(params![
                order_id,
                item.product_id,
                item.quantity,
                amount_to_cents(item.unit_price, "Unit price")?,
            ])?;
        }

        Ok(InsertedOrder {
            id: order_id,
            total_amount,
        })
    }

    fn get_order(&self, id: RecordId) -> RepoResult<Option<Order>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ORDER_SELECT_SQL} WHERE o.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => {
                let mut order = parse_order_row(row)?;
                order.items = load_items(self.conn, order.id)?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    fn list_orders(&self, query: &OrderListQuery) -> RepoResult<Vec<Order>> {
        let mut sql = format!("{ORDER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.statuses.is_empty() {
            let placeholders = vec!["?"; query.statuses.len()].join(", ");
            sql.push_str(&format!(" AND o.status IN ({placeholders})"));
            bind_values.extend(
                query
                    .statuses
                    .iter()
                    .map(|status| Value::Text(status.code().to_string())),
            );
        }
        if let Some(client_id) = query.client_id {
            sql.push_str(" AND o.client_id = ?");
            bind_values.push(Value::Integer(client_id));
        }
        if let Some(method) = query.payment_method {
            sql.push_str(" AND o.payment_method = ?");
            bind_values.push(Value::Text(method.code().to_string()));
        }
        if let Some(is_paid) = query.is_paid {
            sql.push_str(" AND o.is_paid = ?");
            bind_values.push(Value::Integer(bool_to_int(is_paid)));
        }

        sql.push_str(" ORDER BY o.order_date DESC, o.id DESC");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            orders.push(parse_order_row(row)?);
        }
        for order in &mut orders {
            order.items = load_items(self.conn, order.id)?;
        }
        Ok(orders)
    }

    fn set_status(&self, id: RecordId, status: OrderStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2;",
            params![status.code(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "order", id });
        }
        Ok(())
    }

    fn mark_credit_orders_paid(&self, client_id: RecordId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE orders
             SET is_paid = 1
             WHERE client_id = ?1
               AND payment_method = ?2
               AND is_paid = 0;",
            params![client_id, PaymentMethod::Credit.code()],
        )?;
        Ok(changed)
    }
}

fn load_items(conn: &Connection, order_id: RecordId) -> RepoResult<Vec<OrderItem>> {
    let mut stmt = conn.prepare(ITEM_SELECT_SQL)?;
    let mut rows = stmt.query([order_id])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(OrderItem {
            id: row.get("id")?,
            order_id: row.get("order_id")?,
            product_id: row.get("product_id")?,
            product_name: row.get("product_name")?,
            quantity: row.get("quantity")?,
            unit_price: from_cents(row.get("unit_price_cents")?),
        });
    }
    Ok(items)
}

fn parse_order_row(row: &Row<'_>) -> RepoResult<Order> {
    let status_text: String = row.get("status")?;
    let status = OrderStatus::from_code(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid order status `{status_text}` in orders.status"))
    })?;

    let method_text: String = row.get("payment_method")?;
    let payment_method = PaymentMethod::from_code(&method_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid payment method `{method_text}` in orders.payment_method"
        ))
    })?;

    Ok(Order {
        id: row.get("id")?,
        order_date: row.get("order_date")?,
        total_amount: from_cents(row.get("total_amount_cents")?),
        status,
        client_id: row.get("client_id")?,
        client_name: row.get("client_name")?,
        payment_method,
        is_paid: parse_bool(row.get("is_paid")?, "orders.is_paid")?,
        items: Vec::new(),
    })
}
