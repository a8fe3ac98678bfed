//! Core domain logic for the snack bar point of sale.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod messaging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, DatabaseLocation};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use messaging::{AppMessage, MessageBus, StatusMessage, Subscription};
pub use model::client::Client;
pub use model::order::{Order, OrderItem, OrderStatus, PaymentMethod};
pub use model::product::Product;
pub use model::stock::{MovementType, StockMovement};
pub use model::{RecordId, ValidationError};
pub use repo::{RepoError, RepoResult, Repository};
pub use service::catalog_service::{CatalogService, ProductForm};
pub use service::client_service::{ClientForm, ClientService};
pub use service::inventory_service::InventoryService;
pub use service::order_status_service::{OrderStatusService, StatusFilter};
pub use service::payment_service::{PaymentReceipt, PaymentService};
pub use service::sales_service::{CartItem, SalesService};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
