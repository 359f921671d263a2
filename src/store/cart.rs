//! Session-keyed shopping carts.

use serde::Serialize;

use crate::store::{Database, Money, StoreError};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 999;

fn check_quantity(quantity: u32) -> Result<(), StoreError> {
    if quantity == 0 || quantity > MAX_LINE_QUANTITY {
        return Err(StoreError::InvalidQuantity);
    }
    Ok(())
}

/// A raw cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: u64,
    pub quantity: u32,
}

/// A cart row joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product_id: u64,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

impl Database {
    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// A merged line is capped at [`MAX_LINE_QUANTITY`].
    pub fn add_to_cart(&self, session_id: &str, product_id: u64, quantity: u32) -> Result<(), StoreError> {
        check_quantity(quantity)?;
        let mut tables = self.write()?;
        if tables.product(product_id).is_none() {
            return Err(StoreError::ProductNotFound(product_id));
        }

        let lines = tables.carts.entry(session_id.to_string()).or_default();
        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY),
            None => lines.push(CartLine { product_id, quantity }),
        }
        Ok(())
    }

    pub fn remove_from_cart(&self, session_id: &str, product_id: u64) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if let Some(lines) = tables.carts.get_mut(session_id) {
            lines.retain(|l| l.product_id != product_id);
        }
        Ok(())
    }

    /// Set a line's quantity. Unknown lines are left alone.
    pub fn update_cart_quantity(&self, session_id: &str, product_id: u64, quantity: u32) -> Result<(), StoreError> {
        check_quantity(quantity)?;
        let mut tables = self.write()?;
        if let Some(line) = tables
            .carts
            .get_mut(session_id)
            .and_then(|lines| lines.iter_mut().find(|l| l.product_id == product_id))
        {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Cart lines joined with product data, in insertion order.
    pub fn cart_items(&self, session_id: &str) -> Result<Vec<CartItem>, StoreError> {
        let tables = self.read()?;
        let Some(lines) = tables.carts.get(session_id) else {
            return Ok(Vec::new());
        };

        Ok(lines
            .iter()
            .filter_map(|line| {
                tables.product(line.product_id).map(|p| CartItem {
                    product_id: p.id,
                    name: p.name.clone(),
                    price: p.price,
                    image_url: p.image_url.clone(),
                    quantity: line.quantity,
                })
            })
            .collect())
    }

    /// Sum of quantities.
    pub fn cart_item_count(&self, session_id: &str) -> Result<u32, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .carts
            .get(session_id)
            .map(|lines| lines.iter().fold(0u32, |count, l| count.saturating_add(l.quantity)))
            .unwrap_or(0))
    }

    pub fn cart_total(&self, session_id: &str) -> Result<Money, StoreError> {
        Ok(self.cart_items(session_id)?.iter().map(CartItem::line_total).sum())
    }

    pub fn clear_cart(&self, session_id: &str) -> Result<(), StoreError> {
        self.write()?.carts.remove(session_id);
        Ok(())
    }
}
