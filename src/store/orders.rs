//! Orders and order items.
//!
//! # Design Decisions
//! - `create_order` holds the write lock for the whole operation
//! - Stock for every line is checked before anything is written, so a
//!   shortage leaves the tables untouched (rollback)

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::{CartItem, Database, Money, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: u64,
    pub user_id: u64,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub id: u64,
    pub order_id: u64,
    pub product_id: u64,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

/// An order item joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: u64,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

/// Input for [`Database::create_order`].
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: u64,
    pub items: &'a [CartItem],
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: String,
}

impl Database {
    /// Place an order and decrement stock, all or nothing.
    pub fn create_order(&self, new: NewOrder<'_>) -> Result<u64, StoreError> {
        if new.items.is_empty() {
            return Err(StoreError::EmptyOrder);
        }

        let mut tables = self.write()?;

        let mut wanted: HashMap<u64, u32> = HashMap::new();
        for item in new.items {
            *wanted.entry(item.product_id).or_default() += item.quantity;
        }
        for (&product_id, &quantity) in &wanted {
            let available = tables.product(product_id).map(|p| p.stock_quantity).unwrap_or(0);
            if available < quantity {
                tracing::warn!(product_id, quantity, available, "Order rejected: insufficient stock");
                return Err(StoreError::InsufficientStock { product_id });
            }
        }

        let order_id = tables.orders.iter().map(|o| o.id).max().unwrap_or(0) + 1;
        let mut next_item_id = tables.order_items.iter().map(|i| i.id).max().unwrap_or(0);

        for item in new.items {
            next_item_id += 1;
            tables.order_items.push(OrderItem {
                id: next_item_id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.price,
                total_price: item.line_total(),
            });
        }
        for product in tables.products.iter_mut() {
            if let Some(quantity) = wanted.get(&product.id) {
                product.stock_quantity -= quantity;
            }
        }

        let total_amount = new.items.iter().map(CartItem::line_total).sum();
        tables.orders.push(Order {
            id: order_id,
            user_id: new.user_id,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address: new.shipping_address,
            billing_address: new.billing_address,
            payment_method: new.payment_method,
            created_at: Utc::now(),
        });

        tracing::info!(order_id, user_id = new.user_id, total = %total_amount, "Order created");
        Ok(order_id)
    }

    pub fn order(&self, id: u64) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.iter().find(|o| o.id == id).cloned())
    }

    /// A user's orders, newest first.
    pub fn orders_for_user(&self, user_id: u64) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    pub fn order_lines(&self, order_id: u64) -> Result<Vec<OrderLine>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .filter_map(|i| {
                tables.product(i.product_id).map(|p| OrderLine {
                    product_id: i.product_id,
                    name: p.name.clone(),
                    image_url: p.image_url.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    total_price: i.total_price,
                })
            })
            .collect())
    }
}
