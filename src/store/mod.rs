//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! CatalogConfig (startup)
//!     → Database::from_catalog (tables populated, connected flag set)
//!     → Arc<Database> handed to the shop layer
//!
//! Handler call:
//!     → catalog.rs / cart.rs / users.rs / orders.rs
//!     → RwLock<Tables> (short read or write section)
//!     → Result<_, StoreError>
//! ```
//!
//! # Design Decisions
//! - Explicitly constructed handle, no global instance
//! - A disconnected handle fails every call with `NotConnected`
//! - Order creation is one write section: all-or-nothing

pub mod cart;
pub mod catalog;
pub mod money;
pub mod orders;
pub mod users;

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::config::CatalogConfig;

pub use cart::{CartItem, CartLine, MAX_LINE_QUANTITY};
pub use catalog::{Category, Product};
pub use money::Money;
pub use orders::{NewOrder, Order, OrderItem, OrderLine, OrderStatus};
pub use users::{NewUser, User};

/// Persistence failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("database connection failed")]
    NotConnected,

    #[error("database lock poisoned")]
    Poisoned,

    #[error("product {0} not found")]
    ProductNotFound(u64),

    #[error("insufficient stock for product ID: {product_id}")]
    InsufficientStock { product_id: u64 },

    #[error("quantity must be between 1 and {}", cart::MAX_LINE_QUANTITY)]
    InvalidQuantity,

    #[error("order has no items")]
    EmptyOrder,

    #[error("username or email already exists")]
    DuplicateUser,
}

#[derive(Default)]
pub(crate) struct Tables {
    pub(crate) categories: Vec<Category>,
    pub(crate) products: Vec<Product>,
    pub(crate) carts: HashMap<String, Vec<CartLine>>,
    pub(crate) users: Vec<User>,
    pub(crate) orders: Vec<Order>,
    pub(crate) order_items: Vec<OrderItem>,
}

impl Tables {
    pub(crate) fn product(&self, id: u64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Handle to the storefront's data.
pub struct Database {
    connected: bool,
    tables: RwLock<Tables>,
}

impl Database {
    /// An empty, connected database.
    pub fn in_memory() -> Self {
        Self {
            connected: true,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// A handle whose every operation fails with `NotConnected`.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Build a database holding the configured catalog.
    pub fn from_catalog(catalog: &CatalogConfig) -> Self {
        if !catalog.connected {
            tracing::warn!("Database marked as disconnected; storefront will serve error pages");
            return Self::disconnected();
        }

        let tables = Tables {
            categories: catalog.categories.clone(),
            products: catalog.products.clone(),
            ..Tables::default()
        };
        tracing::info!(
            categories = tables.categories.len(),
            products = tables.products.len(),
            "Catalog loaded"
        );

        Self {
            connected: true,
            tables: RwLock::new(tables),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        if !self.connected {
            return Err(StoreError::NotConnected);
        }
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        if !self.connected {
            return Err(StoreError::NotConnected);
        }
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn category(id: u64, name: &str, parent_id: Option<u64>) -> Category {
        Category {
            id,
            name: name.to_string(),
            description: format!("{name} things"),
            parent_id,
        }
    }

    pub fn product(id: u64, category_id: u64, name: &str, cents: u64, stock: u32) -> Product {
        Product {
            id,
            category_id: Some(category_id),
            name: name.to_string(),
            description: format!("A fine {}", name.to_lowercase()),
            price: Money::from_cents(cents),
            stock_quantity: stock,
            image_url: None,
        }
    }

    /// Three categories (one nested) and four products.
    pub fn catalog() -> CatalogConfig {
        CatalogConfig {
            connected: true,
            categories: vec![
                category(1, "Electronics", None),
                category(2, "Books", None),
                category(3, "Headphones", Some(1)),
            ],
            products: vec![
                product(1, 1, "Laptop", 129_999, 5),
                product(2, 3, "Headphones", 8_950, 10),
                product(3, 2, "Rust Book", 3_999, 2),
                product(4, 2, "Cookbook", 2_500, 0),
            ],
        }
    }

    pub fn database() -> Database {
        Database::from_catalog(&catalog())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_fails_every_call() {
        let db = Database::disconnected();
        assert!(!db.is_connected());
        assert_eq!(db.products(None).unwrap_err(), StoreError::NotConnected);
        assert_eq!(db.cart_item_count("s").unwrap_err(), StoreError::NotConnected);
        assert_eq!(db.find_user_by_email("a@b.c").unwrap_err(), StoreError::NotConnected);
        assert_eq!(db.orders_for_user(1).unwrap_err(), StoreError::NotConnected);
    }

    #[test]
    fn test_catalog_flag_controls_connection() {
        let mut catalog = fixtures::catalog();
        catalog.connected = false;
        assert!(!Database::from_catalog(&catalog).is_connected());
        assert!(fixtures::database().is_connected());
    }
}
