use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use snackbar_core::db::open_db_in_memory;
use snackbar_core::messaging::{AppMessage, MessageBus, StatusMessage};
use snackbar_core::model::client::Client;
use snackbar_core::model::order::{OrderStatus, PaymentMethod};
use snackbar_core::model::product::Product;
use snackbar_core::model::stock::MovementType;
use snackbar_core::model::RecordId;
use snackbar_core::repo::client_repo::SqliteClientRepository;
use snackbar_core::repo::order_repo::{OrderRepository, SqliteOrderRepository};
use snackbar_core::repo::product_repo::SqliteProductRepository;
use snackbar_core::repo::stock_repo::{SqliteStockMovementRepository, StockMovementRepository};
use snackbar_core::repo::Repository;
use snackbar_core::service::sales_service::{
    SalesService, CREDIT_REQUIRES_CLIENT_MESSAGE, EMPTY_CART_MESSAGE,
};
use snackbar_core::service::ServiceError;

struct Fixture {
    conn: Connection,
    bus: MessageBus,
    burger: RecordId,
    juice: RecordId,
    client: RecordId,
}

fn fixture() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let products = SqliteProductRepository::new(&conn);
    let mut burger = Product::new("Product A", dec!(10.00));
    burger.stock_quantity = 20.0;
    let burger = products.add(&burger).unwrap();
    let mut juice = Product::new("Product B", dec!(5.00));
    juice.stock_quantity = 8.0;
    let juice = products.add(&juice).unwrap();
    let client = SqliteClientRepository::new(&conn)
        .add(&Client::new("Ana", "11 98888-7777"))
        .unwrap();

    Fixture {
        conn,
        bus: MessageBus::new(),
        burger,
        juice,
        client,
    }
}

fn loaded_sales(fx: &Fixture) -> SalesService {
    let mut sales = SalesService::new(fx.bus.clone());
    sales.load(&fx.conn).unwrap();
    sales
}

fn fill_example_cart(sales: &mut SalesService, fx: &Fixture) {
    assert!(sales.add_product_by_id(fx.burger));
    sales.increase_quantity(fx.burger);
    assert!(sales.add_product_by_id(fx.juice));
}

fn order_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM orders;", [], |row| row.get(0))
        .unwrap()
}

fn balance(conn: &Connection, client_id: RecordId) -> Decimal {
    SqliteClientRepository::new(conn)
        .get_by_id(client_id)
        .unwrap()
        .unwrap()
        .outstanding_balance
}

fn stock(conn: &Connection, product_id: RecordId) -> f64 {
    SqliteProductRepository::new(conn)
        .get_by_id(product_id)
        .unwrap()
        .unwrap()
        .stock_quantity
}

#[test]
fn cash_checkout_persists_order_items_and_stock_movements() {
    let mut fx = fixture();
    let subscription = fx.bus.subscribe();
    let mut sales = loaded_sales(&fx);
    fill_example_cart(&mut sales, &fx);
    assert_eq!(sales.total_amount(), dec!(25.00));

    let inserted = sales.finalize(&mut fx.conn).unwrap();
    assert_eq!(inserted.total_amount, dec!(25.00));

    let order = SqliteOrderRepository::new(&fx.conn)
        .get_order(inserted.id)
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::Cash);
    assert!(order.is_paid);
    assert_eq!(order.client_id, None);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items_total(), order.total_amount);

    assert_eq!(stock(&fx.conn, fx.burger), 18.0);
    assert_eq!(stock(&fx.conn, fx.juice), 7.0);
    let movements = SqliteStockMovementRepository::new(&fx.conn)
        .list_for_product(fx.burger)
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].kind, MovementType::Sale);
    assert_eq!(movements[0].quantity, 2.0);
    assert_eq!(
        movements[0].reason.as_deref(),
        Some(format!("Order #{}", inserted.id).as_str())
    );

    assert!(sales.cart().is_empty());
    assert_eq!(sales.payment_method(), PaymentMethod::Cash);

    let messages = subscription.drain();
    assert_eq!(
        messages.first(),
        Some(&AppMessage::OrderCreated {
            order_id: inserted.id,
            total_amount: dec!(25.00),
        })
    );
    assert!(messages.contains(&AppMessage::StockChanged {
        product_id: fx.juice
    }));
    assert_eq!(
        messages.last(),
        Some(&AppMessage::Status(StatusMessage::success(format!(
            "Order #{} completed successfully!",
            inserted.id
        ))))
    );
}

#[test]
fn credit_without_client_is_blocked_and_writes_nothing() {
    let mut fx = fixture();
    let subscription = fx.bus.subscribe();
    let mut sales = loaded_sales(&fx);
    fill_example_cart(&mut sales, &fx);
    sales.set_payment_method(PaymentMethod::Credit);

    let err = sales.finalize(&mut fx.conn).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Rejected(ref message) if message == CREDIT_REQUIRES_CLIENT_MESSAGE
    ));
    assert_eq!(order_count(&fx.conn), 0);
    assert_eq!(sales.cart().len(), 2);
    assert_eq!(sales.total_amount(), dec!(25.00));
    assert_eq!(
        subscription.drain_statuses(),
        vec![StatusMessage::failure(CREDIT_REQUIRES_CLIENT_MESSAGE)]
    );
}

#[test]
fn empty_cart_cannot_be_finalized() {
    let mut fx = fixture();
    let mut sales = loaded_sales(&fx);

    assert!(!sales.can_finalize());
    let err = sales.finalize(&mut fx.conn).unwrap_err();

    assert_eq!(err.to_string(), EMPTY_CART_MESSAGE);
    assert_eq!(order_count(&fx.conn), 0);
}

#[test]
fn credit_checkout_charges_client_and_leaves_order_unpaid() {
    let mut fx = fixture();
    let mut sales = loaded_sales(&fx);
    fill_example_cart(&mut sales, &fx);
    sales.select_client(Some(fx.client));
    sales.set_payment_method(PaymentMethod::Credit);

    let inserted = sales.finalize(&mut fx.conn).unwrap();

    let order = SqliteOrderRepository::new(&fx.conn)
        .get_order(inserted.id)
        .unwrap()
        .unwrap();
    assert!(!order.is_paid);
    assert_eq!(order.client_id, Some(fx.client));
    assert_eq!(order.client_name.as_deref(), Some("Ana"));
    assert_eq!(balance(&fx.conn, fx.client), dec!(25.00));
    assert!(sales.selected_client().is_none());
}

#[test]
fn non_credit_checkout_with_client_does_not_touch_balance() {
    let mut fx = fixture();
    let mut sales = loaded_sales(&fx);
    fill_example_cart(&mut sales, &fx);
    sales.select_client(Some(fx.client));
    sales.set_payment_method(PaymentMethod::Card);

    sales.finalize(&mut fx.conn).unwrap();

    assert_eq!(balance(&fx.conn, fx.client), Decimal::ZERO);
}

#[test]
fn failed_commit_rolls_back_order_balance_and_stock() {
    let mut fx = fixture();
    let subscription = fx.bus.subscribe();
    let mut sales = loaded_sales(&fx);
    fill_example_cart(&mut sales, &fx);
    sales.select_client(Some(fx.client));
    sales.set_payment_method(PaymentMethod::Credit);

    fx.conn
        .execute_batch(
            "CREATE TRIGGER fail_stock_movement BEFORE INSERT ON stock_movements
             BEGIN SELECT RAISE(ABORT, 'stock ledger unavailable'); END;",
        )
        .unwrap();

    let err = sales.finalize(&mut fx.conn).unwrap_err();

    assert!(matches!(err, ServiceError::Repo(_)));
    assert_eq!(order_count(&fx.conn), 0);
    assert_eq!(balance(&fx.conn, fx.client), Decimal::ZERO);
    assert_eq!(stock(&fx.conn, fx.burger), 20.0);
    assert_eq!(stock(&fx.conn, fx.juice), 8.0);

    assert_eq!(sales.cart().len(), 2);
    assert_eq!(sales.selected_client().map(|client| client.id), Some(fx.client));
    assert_eq!(sales.payment_method(), PaymentMethod::Credit);

    let statuses = subscription.drain_statuses();
    assert_eq!(statuses.len(), 1);
    assert!(!statuses[0].is_success);
    assert!(statuses[0].content.starts_with("Failed to finalize order:"));
}

#[test]
fn deactivated_product_in_cart_blocks_checkout() {
    let mut fx = fixture();
    let mut sales = loaded_sales(&fx);
    fill_example_cart(&mut sales, &fx);
    SqliteProductRepository::new(&fx.conn)
        .set_active(fx.juice, false)
        .unwrap();

    let err = sales.finalize(&mut fx.conn).unwrap_err();

    assert!(matches!(err, ServiceError::Rejected(_)));
    assert_eq!(order_count(&fx.conn), 0);
    assert_eq!(stock(&fx.conn, fx.burger), 20.0);
}

#[test]
fn unit_price_is_frozen_when_added_to_cart() {
    let mut fx = fixture();
    let mut sales = loaded_sales(&fx);
    assert!(sales.add_product_by_id(fx.burger));

    let products = SqliteProductRepository::new(&fx.conn);
    let mut burger = products.get_by_id(fx.burger).unwrap().unwrap();
    burger.price = dec!(12.00);
    products.update(&burger).unwrap();

    let inserted = sales.finalize(&mut fx.conn).unwrap();
    assert_eq!(inserted.total_amount, dec!(10.00));
}

#[test]
fn catalog_changes_reload_the_sales_pickers() {
    let fx = fixture();
    let mut sales = loaded_sales(&fx);
    SqliteProductRepository::new(&fx.conn)
        .add(&Product::new("Pastel", dec!(8.00)))
        .unwrap();

    assert!(!sales
        .handle_message(&fx.conn, &AppMessage::OrderCreated {
            order_id: 1,
            total_amount: dec!(1.00),
        })
        .unwrap());
    assert_eq!(sales.products().len(), 2);

    assert!(sales
        .handle_message(&fx.conn, &AppMessage::ProductsChanged)
        .unwrap());
    assert_eq!(sales.products().len(), 3);
}
