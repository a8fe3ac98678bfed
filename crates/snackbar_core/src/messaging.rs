//! In-process publish/subscribe for cross-screen notifications.
//!
//! # Responsibility
//! - Carry user-facing status messages (success/failure + text).
//! - Tell screens when shared data changed so they can reload.
//!
//! # Invariants
//! - `publish` never fails and never blocks; dropped subscribers are pruned.
//! - Every live subscriber receives every message published after it subscribed,
//!   in publish order.

use crate::model::RecordId;
use log::debug;
use rust_decimal::Decimal;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// User-facing outcome notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub content: String,
    pub is_success: bool,
}

impl StatusMessage {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_success: true,
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_success: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMessage {
    Status(StatusMessage),
    OrderCreated {
        order_id: RecordId,
        total_amount: Decimal,
    },
    ProductsChanged,
    ClientsChanged,
    StockChanged {
        product_id: RecordId,
    },
}

impl AppMessage {
    fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::OrderCreated { .. } => "order_created",
            Self::ProductsChanged => "products_changed",
            Self::ClientsChanged => "clients_changed",
            Self::StockChanged { .. } => "stock_changed",
        }
    }
}

/// Cloneable handle to one shared message bus.
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    subscribers: Arc<Mutex<Vec<Sender<AppMessage>>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        Subscription { receiver }
    }

    pub fn publish(&self, message: AppMessage) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|sender| sender.send(message.clone()).is_ok());
        debug!(
            "event=message_publish module=messaging kind={} subscribers={}",
            message.kind(),
            subscribers.len()
        );
    }

    pub fn status_ok(&self, content: impl Into<String>) {
        self.publish(AppMessage::Status(StatusMessage::success(content)));
    }

    pub fn status_err(&self, content: impl Into<String>) {
        self.publish(AppMessage::Status(StatusMessage::failure(content)));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Receiving end of a bus subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<AppMessage>,
}

impl Subscription {
    pub fn try_recv(&self) -> Option<AppMessage> {
        self.receiver.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<AppMessage> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Returns every message queued so far without blocking.
    pub fn drain(&self) -> Vec<AppMessage> {
        self.receiver.try_iter().collect()
    }

    /// Status messages among the queued ones, discarding the rest.
    pub fn drain_statuses(&self) -> Vec<StatusMessage> {
        self.drain()
            .into_iter()
            .filter_map(|message| match message {
                AppMessage::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{AppMessage, MessageBus, StatusMessage};
    use std::thread;

    #[test]
    fn every_subscriber_receives_messages_in_order() {
        let bus = MessageBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(AppMessage::ProductsChanged);
        bus.status_ok("saved");

        let expected = vec![
            AppMessage::ProductsChanged,
            AppMessage::Status(StatusMessage::success("saved")),
        ];
        assert_eq!(first.drain(), expected);
        assert_eq!(second.drain(), expected);
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_publish() {
        let bus = MessageBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.status_err("boom");
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(
            kept.drain_statuses(),
            vec![StatusMessage::failure("boom")]
        );
    }

    #[test]
    fn late_subscriber_misses_earlier_messages() {
        let bus = MessageBus::new();
        bus.publish(AppMessage::ClientsChanged);
        let late = bus.subscribe();
        assert!(late.try_recv().is_none());
    }

    #[test]
    fn clones_share_subscribers_across_threads() {
        let bus = MessageBus::new();
        let subscription = bus.subscribe();
        let publisher = bus.clone();

        thread::spawn(move || publisher.publish(AppMessage::StockChanged { product_id: 7 }))
            .join()
            .unwrap();

        assert_eq!(
            subscription.try_recv(),
            Some(AppMessage::StockChanged { product_id: 7 })
        );
    }
}
