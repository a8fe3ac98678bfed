//! Order Status screen: kitchen board of orders and their progress.

use super::{fail, ServiceResult};
use crate::messaging::{AppMessage, MessageBus};
use crate::model::order::{Order, OrderStatus};
use crate::model::RecordId;
use crate::repo::order_repo::{OrderListQuery, OrderRepository, SqliteOrderRepository};
use log::info;
use rusqlite::Connection;
use std::fmt::{Display, Formatter};

const MODULE: &str = "order_status";

/// Which orders the board shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Orders that are not finalized yet (pending or in preparation).
    #[default]
    Active,
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    /// Filter choices in display order: active, all, then each status.
    pub fn options() -> Vec<StatusFilter> {
        let mut options = vec![Self::Active, Self::All];
        options.extend(OrderStatus::ALL.into_iter().map(Self::Only));
        options
    }

    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            Self::Active => !status.is_finalized(),
            Self::All => true,
            Self::Only(expected) => status == expected,
        }
    }

    fn statuses(self) -> Vec<OrderStatus> {
        match self {
            Self::All => Vec::new(),
            other => OrderStatus::ALL
                .into_iter()
                .filter(|status| other.matches(*status))
                .collect(),
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::All => f.write_str("All"),
            Self::Only(status) => f.write_str(status.display_name()),
        }
    }
}

pub struct OrderStatusService {
    bus: MessageBus,
    filter: StatusFilter,
    orders: Vec<Order>,
}

impl OrderStatusService {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            filter: StatusFilter::default(),
            orders: Vec::new(),
        }
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Loads orders matching the current filter, newest first.
    pub fn load(&mut self, conn: &Connection) -> ServiceResult<()> {
        let query = OrderListQuery {
            statuses: self.filter.statuses(),
            ..OrderListQuery::default()
        };
        match SqliteOrderRepository::new(conn).list_orders(&query) {
            Ok(orders) => {
                self.orders = orders;
                Ok(())
            }
            Err(err) => fail(&self.bus, MODULE, "load orders", err),
        }
    }

    pub fn set_filter(&mut self, conn: &Connection, filter: StatusFilter) -> ServiceResult<()> {
        self.filter = filter;
        self.load(conn)
    }

    /// Reloads when a new order arrives. Returns whether it reloaded.
    pub fn handle_message(
        &mut self,
        conn: &Connection,
        message: &AppMessage,
    ) -> ServiceResult<bool> {
        match message {
            AppMessage::OrderCreated { .. } => {
                self.load(conn)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Persists a status change. The order leaves the visible list when it
    /// no longer matches the filter.
    pub fn change_status(
        &mut self,
        conn: &Connection,
        order_id: RecordId,
        status: OrderStatus,
    ) -> ServiceResult<()> {
        if let Err(err) = SqliteOrderRepository::new(conn).set_status(order_id, status) {
            return fail(&self.bus, MODULE, "update order status", err);
        }

        info!(
            "event=order_status_change module={MODULE} status=ok order_id={order_id} new_status={}",
            status.code()
        );
        if let Some(order) = self.orders.iter_mut().find(|order| order.id == order_id) {
            order.status = status;
        }
        let filter = self.filter;
        self.orders.retain(|order| filter.matches(order.status));
        self.bus.status_ok(format!(
            "Order #{order_id} updated to {}!",
            status.display_name()
        ));
        Ok(())
    }
}
