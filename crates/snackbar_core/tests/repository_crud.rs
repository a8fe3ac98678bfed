use rust_decimal_macros::dec;
use snackbar_core::db::open_db_in_memory;
use snackbar_core::model::client::Client;
use snackbar_core::model::money::from_cents;
use snackbar_core::model::order::{NewOrder, NewOrderItem, OrderStatus, PaymentMethod};
use snackbar_core::model::product::Product;
use snackbar_core::model::ValidationError;
use snackbar_core::repo::client_repo::SqliteClientRepository;
use snackbar_core::repo::order_repo::{OrderListQuery, OrderRepository, SqliteOrderRepository};
use snackbar_core::repo::product_repo::SqliteProductRepository;
use snackbar_core::repo::{RepoError, Repository};

#[test]
fn product_crud_roundtrip_keeps_money_exact() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProductRepository::new(&conn);

    let mut product = Product::new("X-Salada", dec!(18.90));
    product.category = "Lanches".to_string();
    product.description = Some("Pão, carne, alface".to_string());
    let id = repo.add(&product).unwrap();

    let mut loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.price, dec!(18.90));
    assert_eq!(loaded.category, "Lanches");
    assert!(loaded.is_active);
    assert_eq!(loaded.min_stock_level, Product::DEFAULT_MIN_STOCK_LEVEL);

    loaded.price = dec!(19.50);
    loaded.is_combo = true;
    repo.update(&loaded).unwrap();

    let updated = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(updated.price, dec!(19.50));
    assert!(updated.is_combo);
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

#[test]
fn writes_validate_before_touching_the_table() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProductRepository::new(&conn);

    let err = repo.add(&Product::new("  ", dec!(1.00))).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::Required("Product name"))
    ));

    let err = repo.add(&Product::new("Suco", dec!(1.005))).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::TooPrecise("Price"))
    ));
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn update_and_delete_of_missing_rows_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::new(&conn);

    let mut ghost = Client::new("Ghost", "11 99999-0000");
    ghost.id = 77;

    assert!(matches!(
        repo.update(&ghost).unwrap_err(),
        RepoError::NotFound {
            entity: "client",
            id: 77
        }
    ));
    assert!(matches!(
        repo.delete(77).unwrap_err(),
        RepoError::NotFound { id: 77, .. }
    ));
}

#[test]
fn hard_delete_of_referenced_product_fails_but_soft_delete_keeps_history() {
    let conn = open_db_in_memory().unwrap();
    let products = SqliteProductRepository::new(&conn);
    let orders = SqliteOrderRepository::new(&conn);

    let product_id = products.add(&Product::new("Coxinha", dec!(6.00))).unwrap();
    let order = orders
        .insert_order(&NewOrder {
            client_id: None,
            payment_method: PaymentMethod::Cash,
            items: vec![NewOrderItem {
                product_id,
                quantity: 2,
                unit_price: dec!(6.00),
            }],
        })
        .unwrap();

    assert!(matches!(products.delete(product_id), Err(RepoError::Db(_))));

    products.set_active(product_id, false).unwrap();
    assert!(products.list_active().unwrap().is_empty());

    let stored = orders.get_order(order.id).unwrap().unwrap();
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].product_name.as_deref(), Some("Coxinha"));
    assert_eq!(stored.total_amount, dec!(12.00));
}

#[test]
fn debtors_are_active_clients_with_balance_largest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::new(&conn);

    let small = repo.add(&Client::new("Ana", "11 91111-1111")).unwrap();
    let large = repo.add(&Client::new("Bruno", "11 92222-2222")).unwrap();
    let inactive = repo.add(&Client::new("Carla", "11 93333-3333")).unwrap();
    repo.add(&Client::new("Davi", "11 94444-4444")).unwrap();

    repo.adjust_balance(small, dec!(10.00)).unwrap();
    repo.adjust_balance(large, dec!(45.50)).unwrap();
    repo.adjust_balance(inactive, dec!(99.00)).unwrap();
    repo.set_active(inactive, false).unwrap();

    let debtors: Vec<_> = repo
        .list_debtors()
        .unwrap()
        .into_iter()
        .map(|client| client.id)
        .collect();
    assert_eq!(debtors, vec![large, small]);
}

#[test]
fn balance_cannot_drop_below_zero() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::new(&conn);
    let id = repo.add(&Client::new("Ana", "11 91111-1111")).unwrap();
    repo.adjust_balance(id, dec!(5.00)).unwrap();

    assert!(matches!(
        repo.adjust_balance(id, dec!(-5.01)),
        Err(RepoError::Db(_))
    ));
    assert_eq!(
        repo.get_by_id(id).unwrap().unwrap().outstanding_balance,
        dec!(5.00)
    );
}

#[test]
fn order_listing_filters_and_sorts_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let product_id = SqliteProductRepository::new(&conn)
        .add(&Product::new("Pastel", dec!(8.00)))
        .unwrap();
    let orders = SqliteOrderRepository::new(&conn);
    let new_order = |method| NewOrder {
        client_id: None,
        payment_method: method,
        items: vec![NewOrderItem {
            product_id,
            quantity: 1,
            unit_price: dec!(8.00),
        }],
    };

    let first = orders.insert_order(&new_order(PaymentMethod::Cash)).unwrap();
    let second = orders.insert_order(&new_order(PaymentMethod::Card)).unwrap();
    let third = orders
        .insert_order(&new_order(PaymentMethod::MealVoucher))
        .unwrap();
    orders.set_status(second.id, OrderStatus::Ready).unwrap();

    let all: Vec<_> = orders
        .list_orders(&OrderListQuery::default())
        .unwrap()
        .into_iter()
        .map(|order| order.id)
        .collect();
    assert_eq!(all, vec![third.id, second.id, first.id]);

    let pending = orders
        .list_orders(&OrderListQuery {
            statuses: vec![OrderStatus::Pending],
            ..OrderListQuery::default()
        })
        .unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|order| order.status == OrderStatus::Pending));

    let limited = orders
        .list_orders(&OrderListQuery {
            limit: Some(1),
            ..OrderListQuery::default()
        })
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, third.id);

    assert!(matches!(
        orders.set_status(999, OrderStatus::Completed),
        Err(RepoError::NotFound { entity: "order", id: 999 })
    ));
}

#[test]
fn order_total_beyond_storable_cents_is_out_of_range() {
    let conn = open_db_in_memory().unwrap();
    let product_id = SqliteProductRepository::new(&conn)
        .add(&Product::new("Banquete", dec!(1.00)))
        .unwrap();
    let orders = SqliteOrderRepository::new(&conn);

    let err = orders
        .insert_order(&NewOrder {
            client_id: None,
            payment_method: PaymentMethod::Cash,
            items: vec![NewOrderItem {
                product_id,
                quantity: 2,
                unit_price: from_cents(i64::MAX),
            }],
        })
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::OutOfRange("Total amount"))
    ));
    assert_eq!(err.to_string(), "Total amount is too large.");
    assert!(orders.list_orders(&OrderListQuery::default()).unwrap().is_empty());
}
