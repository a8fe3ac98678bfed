//! Operator CLI over the snack bar database.
//!
//! # Responsibility
//! - Load the JSON config, start file logging and open the database.
//! - Print read-only reports (catalog, low stock, tabs, orders) through the
//!   same screen services the desktop front end uses.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use snackbar_core::db::migrations::current_version;
use snackbar_core::{
    core_version, init_logging_from_config, AppConfig, CatalogService, InventoryService,
    MessageBus, Order, OrderStatus, OrderStatusService, PaymentService, StatusFilter,
};

const DEFAULT_CONFIG_PATH: &str = "appsettings.json";

#[derive(Parser)]
#[command(name = "snackbar", about = "Snack bar point-of-sale reports", version)]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show branding, database location and schema version.
    Info,
    /// List active products.
    Products(ProductsArgs),
    /// List products at or below their minimum stock level.
    LowStock,
    /// List clients with an outstanding balance.
    Debtors,
    /// List orders (active ones by default).
    Orders(OrdersArgs),
}

#[derive(Args)]
struct ProductsArgs {
    /// Case-insensitive name filter.
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    category: Option<String>,
}

#[derive(Args)]
struct OrdersArgs {
    /// Include finalized orders.
    #[arg(long, conflicts_with = "status")]
    all: bool,
    /// Only orders with this status code (e.g. `pending`, `ready`).
    #[arg(long, value_parser = parse_status)]
    status: Option<OrderStatus>,
}

fn parse_status(value: &str) -> Result<OrderStatus, String> {
    OrderStatus::from_code(value).ok_or_else(|| {
        let codes: Vec<&str> = OrderStatus::ALL.iter().map(|status| status.code()).collect();
        format!("unknown status `{value}`; expected one of: {}", codes.join(", "))
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_source) = load_config(cli.config.as_deref())?;

    let logging_enabled = init_logging_from_config(&config.logging, config.log_level())
        .map_err(|err| anyhow!("failed to start logging: {err}"))?;
    if logging_enabled {
        info!(
            "event=cli_start module=cli status=ok version={} config={config_source}",
            core_version()
        );
    }

    let location = config
        .database_location()
        .context("invalid database connection string")?;
    let conn = location
        .open()
        .with_context(|| format!("failed to open database `{location}`"))?;

    match cli.command {
        Commands::Info => print_info(&config, &conn, &location.to_string(), cli.json),
        Commands::Products(args) => print_products(&conn, args, cli.json),
        Commands::LowStock => print_low_stock(&conn, cli.json),
        Commands::Debtors => print_debtors(&conn, cli.json),
        Commands::Orders(args) => print_orders(&conn, args, cli.json),
    }
}

/// Loads the config and describes where it came from for the start-up log.
///
/// Without `--config`, a missing default file falls back to built-in defaults.
fn load_config(path: Option<&Path>) -> Result<(AppConfig, String)> {
    match path {
        Some(path) => {
            let config = AppConfig::load(path)
                .with_context(|| format!("failed to load config `{}`", path.display()))?;
            Ok((config, path.display().to_string()))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            let config =
                AppConfig::load(DEFAULT_CONFIG_PATH).context("failed to load default config")?;
            Ok((config, DEFAULT_CONFIG_PATH.to_string()))
        }
        None => Ok((AppConfig::default(), "defaults".to_string())),
    }
}

#[derive(Serialize)]
struct InfoReport<'a> {
    name: &'a str,
    logo: &'a str,
    theme: &'a str,
    database: &'a str,
    schema_version: u32,
    core_version: &'a str,
}

fn print_info(config: &AppConfig, conn: &Connection, database: &str, json: bool) -> Result<()> {
    let report = InfoReport {
        name: &config.branding.name,
        logo: &config.branding.logo,
        theme: &config.branding.theme,
        database,
        schema_version: current_version(conn).context("failed to read schema version")?,
        core_version: core_version(),
    };
    if json {
        return print_json(&report);
    }

    println!("{} (theme: {}, logo: {})", report.name, report.theme, report.logo);
    println!("database: {}", report.database);
    println!("schema version: {}", report.schema_version);
    println!("core version: {}", report.core_version);
    Ok(())
}

fn print_products(conn: &Connection, args: ProductsArgs, json: bool) -> Result<()> {
    let mut catalog = CatalogService::new(MessageBus::new());
    catalog.load(conn).context("failed to load products")?;
    catalog.set_category_filter(args.category);
    catalog.set_search_text(args.search.unwrap_or_default());

    let products = catalog.filtered();
    if json {
        return print_json(&products);
    }
    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }
    for product in products {
        println!(
            "#{:<4} {:<30} {:<12} {:>9} stock {:>7.2}{}",
            product.id,
            product.name,
            product.category,
            money(product.price),
            product.stock_quantity,
            if product.is_combo { "  [combo]" } else { "" }
        );
    }
    Ok(())
}

fn print_low_stock(conn: &Connection, json: bool) -> Result<()> {
    let mut inventory = InventoryService::new(MessageBus::new());
    inventory.load(conn).context("failed to load inventory")?;

    let products = inventory.low_stock_products();
    if json {
        return print_json(&products);
    }
    if products.is_empty() {
        println!("All products are above their minimum stock level.");
        return Ok(());
    }
    for product in products {
        println!(
            "#{:<4} {:<30} stock {:>7.2} (min {:.2})",
            product.id, product.name, product.stock_quantity, product.min_stock_level
        );
    }
    Ok(())
}

fn print_debtors(conn: &Connection, json: bool) -> Result<()> {
    let mut payments = PaymentService::new(MessageBus::new());
    payments.load(conn).context("failed to load pending payments")?;

    let debtors = payments.debtors();
    if json {
        return print_json(&debtors);
    }
    if debtors.is_empty() {
        println!("No outstanding balances.");
        return Ok(());
    }
    let total: Decimal = debtors.iter().map(|client| client.outstanding_balance).sum();
    for client in debtors {
        println!(
            "#{:<4} {:<30} {:<16} {:>10}",
            client.id,
            client.name,
            client.phone.as_deref().unwrap_or("-"),
            money(client.outstanding_balance)
        );
    }
    println!("total outstanding: {}", money(total));
    Ok(())
}

fn print_orders(conn: &Connection, args: OrdersArgs, json: bool) -> Result<()> {
    let filter = match (args.all, args.status) {
        (true, _) => StatusFilter::All,
        (false, Some(status)) => StatusFilter::Only(status),
        (false, None) => StatusFilter::Active,
    };
    let mut board = OrderStatusService::new(MessageBus::new());
    board
        .set_filter(conn, filter)
        .with_context(|| format!("failed to load orders ({filter})"))?;

    let orders = board.orders();
    if json {
        return print_json(&orders);
    }
    if orders.is_empty() {
        println!("No orders ({filter}).");
        return Ok(());
    }
    for order in orders {
        print_order(order);
    }
    Ok(())
}

fn print_order(order: &Order) {
    println!(
        "#{:<5} {}  {:<16} {:<14} {:>10}  {}{}",
        order.id,
        format_order_date(order.order_date),
        order.status.display_name(),
        order.payment_method.display_name(),
        money(order.total_amount),
        order.client_name.as_deref().unwrap_or("-"),
        if order.is_paid { "" } else { "  (unpaid)" }
    );
    for item in &order.items {
        println!(
            "        {} x {} @ {}",
            item.quantity,
            item.product_name.as_deref().unwrap_or("?"),
            money(item.unit_price)
        );
    }
}

fn format_order_date(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|date| date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

fn money(amount: Decimal) -> String {
    format!("{amount:.2}")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{format_order_date, money, parse_status, Cli};
    use clap::CommandFactory;
    use rust_decimal_macros::dec;
    use snackbar_core::OrderStatus;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn status_parser_accepts_codes_only() {
        assert_eq!(parse_status("pending"), Ok(OrderStatus::Pending));
        assert!(parse_status("nope").is_err());
    }

    #[test]
    fn money_renders_two_places() {
        assert_eq!(money(dec!(25)), "25.00");
        assert_eq!(money(dec!(7.5)), "7.50");
    }

    #[test]
    fn out_of_range_dates_fall_back_to_raw_millis() {
        assert_eq!(format_order_date(i64::MAX), i64::MAX.to_string());
    }
}
