//! Randomized credit sales and payments against one client tab.

use proptest::prelude::*;
use rusqlite::Connection;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use snackbar_core::db::open_db_in_memory;
use snackbar_core::messaging::MessageBus;
use snackbar_core::model::client::Client;
use snackbar_core::model::order::PaymentMethod;
use snackbar_core::model::product::Product;
use snackbar_core::model::RecordId;
use snackbar_core::repo::client_repo::SqliteClientRepository;
use snackbar_core::repo::order_repo::{OrderListQuery, OrderRepository, SqliteOrderRepository};
use snackbar_core::repo::product_repo::SqliteProductRepository;
use snackbar_core::repo::Repository;
use snackbar_core::service::payment_service::PaymentService;
use snackbar_core::service::sales_service::SalesService;

#[derive(Debug, Clone)]
enum TabOp {
    CreditSale { product: usize, quantity: u8 },
    /// Pays this percentage of the current balance, rounded down to cents.
    Payment { percent: i64 },
}

fn tab_op_strategy() -> impl Strategy<Value = TabOp> {
    prop_oneof![
        (0usize..3, 1u8..4)
            .prop_map(|(product, quantity)| TabOp::CreditSale { product, quantity }),
        (1i64..=130).prop_map(|percent| TabOp::Payment { percent }),
    ]
}

fn setup() -> (Connection, Vec<RecordId>, RecordId) {
    let conn = open_db_in_memory().unwrap();
    let products = SqliteProductRepository::new(&conn);
    let product_ids = [dec!(4.50), dec!(12.99), dec!(0.35)]
        .into_iter()
        .enumerate()
        .map(|(index, price)| {
            let mut product = Product::new(format!("Item {index}"), price);
            product.stock_quantity = 1_000.0;
            products.add(&product).unwrap()
        })
        .collect();
    let client = SqliteClientRepository::new(&conn)
        .add(&Client::new("Fiado", "11 94444-3333"))
        .unwrap();
    (conn, product_ids, client)
}

fn stored_balance(conn: &Connection, client_id: RecordId) -> Decimal {
    SqliteClientRepository::new(conn)
        .get_by_id(client_id)
        .unwrap()
        .unwrap()
        .outstanding_balance
}

fn unpaid_credit_orders(conn: &Connection, client_id: RecordId) -> usize {
    SqliteOrderRepository::new(conn)
        .list_orders(&OrderListQuery {
            client_id: Some(client_id),
            payment_method: Some(PaymentMethod::Credit),
            is_paid: Some(false),
            ..OrderListQuery::default()
        })
        .unwrap()
        .len()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn balance_tracks_credit_sales_minus_accepted_payments(
        ops in prop::collection::vec(tab_op_strategy(), 1..24)
    ) {
        let (mut conn, product_ids, client) = setup();
        let bus = MessageBus::new();
        let mut sales = SalesService::new(bus.clone());
        sales.load(&conn).unwrap();
        let mut payments = PaymentService::new(bus);

        let mut credit_total = Decimal::ZERO;
        let mut paid_total = Decimal::ZERO;

        for op in ops {
            match op {
                TabOp::CreditSale { product, quantity } => {
                    let product_id = product_ids[product];
                    prop_assert!(sales.add_product_by_id(product_id));
                    for _ in 1..quantity {
                        sales.increase_quantity(product_id);
                    }
                    sales.select_client(Some(client));
                    sales.set_payment_method(PaymentMethod::Credit);
                    let inserted = sales.finalize(&mut conn).unwrap();
                    credit_total += inserted.total_amount;
                }
                TabOp::Payment { percent } => {
                    let balance = stored_balance(&conn, client);
                    let amount = (balance * Decimal::from(percent) / Decimal::ONE_HUNDRED)
                        .round_dp_with_strategy(2, RoundingStrategy::ToZero);
                    let accepted = amount > Decimal::ZERO && amount <= balance;

                    let result = payments.receive_payment(&mut conn, client, amount);
                    prop_assert_eq!(
                        result.is_ok(),
                        accepted,
                        "payment of {} against {}",
                        amount,
                        balance
                    );
                    if accepted {
                        paid_total += amount;
                    }
                }
            }

            let balance = stored_balance(&conn, client);
            prop_assert!(balance >= Decimal::ZERO);
            prop_assert_eq!(balance, credit_total - paid_total);
            if balance.is_zero() {
                prop_assert_eq!(unpaid_credit_orders(&conn, client), 0);
            }
        }
    }
}
