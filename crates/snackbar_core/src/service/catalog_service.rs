//! Products screen: catalog listing, filters and product form.
//!
//! # Responsibility
//! - Keep the active product list and the search/category filters.
//! - Insert or update products from a form; soft-delete on removal.
//!
//! # Invariants
//! - Only active products are listed.
//! - Saving never touches `stock_quantity`; stock changes go through the
//!   inventory and sales screens so every change has a movement row.

use super::{fail, matches_search, ServiceError, ServiceResult};
use crate::messaging::{AppMessage, MessageBus};
use crate::model::product::Product;
use crate::model::RecordId;
use crate::repo::product_repo::SqliteProductRepository;
use crate::repo::Repository;
use log::info;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Category filter value that shows every category.
pub const ALL_CATEGORIES: &str = "Todas";

const MODULE: &str = "catalog";

/// Editable product fields. `id == 0` saves a new product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    pub id: RecordId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub is_combo: bool,
    pub min_stock_level: f64,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            category: Product::DEFAULT_CATEGORY.to_string(),
            price: Decimal::ZERO,
            description: None,
            is_combo: false,
            min_stock_level: Product::DEFAULT_MIN_STOCK_LEVEL,
        }
    }
}

impl ProductForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            description: product.description.clone(),
            is_combo: product.is_combo,
            min_stock_level: product.min_stock_level,
        }
    }

    fn apply_to(&self, product: &mut Product) {
        product.name = self.name.trim().to_string();
        product.category = self.category.trim().to_string();
        product.price = self.price;
        product.description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        product.is_combo = self.is_combo;
        product.min_stock_level = self.min_stock_level;
    }
}

pub struct CatalogService {
    bus: MessageBus,
    products: Vec<Product>,
    search_text: String,
    category_filter: Option<String>,
}

impl CatalogService {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            products: Vec::new(),
            search_text: String::new(),
            category_filter: None,
        }
    }

    /// Reloads the active product list.
    pub fn load(&mut self, conn: &Connection) -> ServiceResult<()> {
        match SqliteProductRepository::new(conn).list_active() {
            Ok(products) => {
                self.products = products;
                Ok(())
            }
            Err(err) => fail(&self.bus, MODULE, "load products", err),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// `None`, blank or [`ALL_CATEGORIES`] disables the category filter.
    pub fn set_category_filter(&mut self, category: Option<String>) {
        self.category_filter = category
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty() && value != ALL_CATEGORIES);
    }

    pub fn clear_filters(&mut self) {
        self.search_text.clear();
        self.category_filter = None;
    }

    /// Products matching the current name and category filters.
    pub fn filtered(&self) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| match &self.category_filter {
                Some(category) => product.category.eq_ignore_ascii_case(category),
                None => true,
            })
            .filter(|product| matches_search(&product.name, &self.search_text))
            .collect()
    }

    /// Distinct categories of the loaded products, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.products
            .iter()
            .map(|product| product.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Inserts (`form.id == 0`) or updates a product and returns its id.
    pub fn save(&mut self, conn: &Connection, form: &ProductForm) -> ServiceResult<RecordId> {
        let is_new = form.id == 0;
        let id = match save_product(conn, form) {
            Ok(id) => id,
            Err(err) => return fail(&self.bus, MODULE, "save product", err),
        };

        info!(
            "event=product_save module={MODULE} status=ok product_id={id} is_new={is_new}"
        );
        self.bus.status_ok(if is_new {
            "Product registered successfully!"
        } else {
            "Product updated successfully!"
        });
        self.bus.publish(AppMessage::ProductsChanged);
        // Reload failures are already reported on the bus; the save itself stands.
        let _ = self.load(conn);
        Ok(id)
    }

    /// Soft-deletes a product so existing orders keep resolving it.
    pub fn deactivate(&mut self, conn: &Connection, id: RecordId) -> ServiceResult<()> {
        if let Err(err) = SqliteProductRepository::new(conn).set_active(id, false) {
            return fail(&self.bus, MODULE, "remove product", err);
        }

        info!("event=product_deactivate module={MODULE} status=ok product_id={id}");
        self.products.retain(|product| product.id != id);
        self.bus.status_ok("Product removed successfully!");
        self.bus.publish(AppMessage::ProductsChanged);
        Ok(())
    }
}

fn save_product(conn: &Connection, form: &ProductForm) -> ServiceResult<RecordId> {
    let repo = SqliteProductRepository::new(conn);
    if form.id == 0 {
        let mut product = Product::new(String::new(), Decimal::ZERO);
        form.apply_to(&mut product);
        return Ok(repo.add(&product)?);
    }

    let mut product = repo.get_by_id(form.id)?.ok_or(ServiceError::NotFound {
        entity: "product",
        id: form.id,
    })?;
    form.apply_to(&mut product);
    repo.update(&product)?;
    Ok(product.id)
}
