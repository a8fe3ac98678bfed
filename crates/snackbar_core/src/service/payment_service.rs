//! Pending Payments screen: client tabs and payment collection.
//!
//! # Invariants
//! - A payment is strictly positive and never exceeds the client's balance,
//!   so balances stay non-negative.
//! - When a payment clears the balance, every unpaid credit order of that
//!   client is marked paid in the same transaction.

use super::{fail, ServiceError, ServiceResult};
use crate::messaging::{AppMessage, MessageBus};
use crate::model::client::Client;
use crate::model::money::to_cents;
use crate::model::order::{Order, PaymentMethod};
use crate::model::RecordId;
use crate::repo::client_repo::SqliteClientRepository;
use crate::repo::order_repo::{OrderListQuery, OrderRepository, SqliteOrderRepository};
use crate::repo::Repository;
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;

pub const NON_POSITIVE_PAYMENT_MESSAGE: &str = "Payment amount must be greater than zero.";
pub const PAYMENT_EXCEEDS_BALANCE_MESSAGE: &str =
    "Payment amount cannot exceed the outstanding balance.";

const MODULE: &str = "payments";

/// Outcome of a recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub client_id: RecordId,
    pub amount: Decimal,
    pub remaining_balance: Decimal,
    /// Credit orders flipped to paid because the balance reached zero.
    pub orders_settled: usize,
}

pub struct PaymentService {
    bus: MessageBus,
    debtors: Vec<Client>,
    selected_client_id: Option<RecordId>,
    credit_orders: Vec<Order>,
}

impl PaymentService {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            debtors: Vec::new(),
            selected_client_id: None,
            credit_orders: Vec::new(),
        }
    }

    /// Reloads debtors and, if a client is selected, their credit history.
    pub fn load(&mut self, conn: &Connection) -> ServiceResult<()> {
        match SqliteClientRepository::new(conn).list_debtors() {
            Ok(debtors) => self.debtors = debtors,
            Err(err) => return fail(&self.bus, MODULE, "load pending payments", err),
        }
        match self.selected_client_id {
            Some(client_id) => self.load_credit_orders(conn, client_id),
            None => Ok(()),
        }
    }

    /// Active clients with an open tab, largest balance first.
    pub fn debtors(&self) -> &[Client] {
        &self.debtors
    }

    pub fn selected_client(&self) -> Option<&Client> {
        let id = self.selected_client_id?;
        self.debtors.iter().find(|client| client.id == id)
    }

    /// Credit orders of the selected client, newest first.
    pub fn credit_orders(&self) -> &[Order] {
        &self.credit_orders
    }

    pub fn select_client(
        &mut self,
        conn: &Connection,
        client_id: Option<RecordId>,
    ) -> ServiceResult<()> {
        self.selected_client_id = client_id;
        match client_id {
            Some(client_id) => self.load_credit_orders(conn, client_id),
            None => {
                self.credit_orders.clear();
                Ok(())
            }
        }
    }

    /// Reloads on new orders or client changes. Returns whether it reloaded.
    pub fn handle_message(
        &mut self,
        conn: &Connection,
        message: &AppMessage,
    ) -> ServiceResult<bool> {
        match message {
            AppMessage::OrderCreated { .. } | AppMessage::ClientsChanged => {
                self.load(conn)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Records a payment against a client's tab.
    pub fn receive_payment(
        &mut self,
        conn: &mut Connection,
        client_id: RecordId,
        amount: Decimal,
    ) -> ServiceResult<PaymentReceipt> {
        let receipt = match settle_payment(conn, client_id, amount) {
            Ok(receipt) => receipt,
            Err(err) => return fail(&self.bus, MODULE, "receive payment", err),
        };

        info!(
            "event=payment_receive module={MODULE} status=ok client_id={client_id} amount={} remaining={} orders_settled={}",
            receipt.amount, receipt.remaining_balance, receipt.orders_settled
        );
        self.bus.status_ok(format!(
            "Payment of {:.2} received successfully!",
            receipt.amount
        ));
        self.bus.publish(AppMessage::ClientsChanged);
        if receipt.remaining_balance.is_zero() && self.selected_client_id == Some(client_id) {
            self.selected_client_id = None;
            self.credit_orders.clear();
        }
        let _ = self.load(conn);
        Ok(receipt)
    }

    fn load_credit_orders(&mut self, conn: &Connection, client_id: RecordId) -> ServiceResult<()> {
        let query = OrderListQuery {
            client_id: Some(client_id),
            payment_method: Some(PaymentMethod::Credit),
            ..OrderListQuery::default()
        };
        match SqliteOrderRepository::new(conn).list_orders(&query) {
            Ok(orders) => {
                self.credit_orders = orders;
                Ok(())
            }
            Err(err) => fail(&self.bus, MODULE, "load credit history", err),
        }
    }
}

fn settle_payment(
    conn: &mut Connection,
    client_id: RecordId,
    amount: Decimal,
) -> ServiceResult<PaymentReceipt> {
    if amount <= Decimal::ZERO {
        return Err(ServiceError::rejected(NON_POSITIVE_PAYMENT_MESSAGE));
    }
    to_cents(amount, "Payment amount")?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let receipt = {
        let clients = SqliteClientRepository::new(&tx);
        let client = clients.get_by_id(client_id)?.ok_or(ServiceError::NotFound {
            entity: "client",
            id: client_id,
        })?;
        if amount > client.outstanding_balance {
            return Err(ServiceError::rejected(PAYMENT_EXCEEDS_BALANCE_MESSAGE));
        }

        clients.adjust_balance(client_id, -amount)?;
        let remaining_balance = client.outstanding_balance - amount;
        let orders_settled = if remaining_balance.is_zero() {
            SqliteOrderRepository::new(&tx).mark_credit_orders_paid(client_id)?
        } else {
            0
        };
        PaymentReceipt {
            client_id,
            amount,
            remaining_balance,
            orders_settled,
        }
    };
    tx.commit()?;
    Ok(receipt)
}
