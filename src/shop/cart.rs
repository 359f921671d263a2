//! Shopping cart page and JSON cart endpoints.
//!
//! Cart endpoints accept either a JSON object or a form body with
//! `product_id` and `quantity` fields.

use axum::http::StatusCode;
use serde_json::json;

use crate::http::context::RequestContext;
use crate::routing::{HandlerError, PathParams};
use crate::store::{StoreError, MAX_LINE_QUANTITY};

use super::{views, Shop};

/// Positive `product_id` from the request body.
fn product_id(ctx: &RequestContext) -> Option<u64> {
    ctx.input("product_id")
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|id| *id > 0)
}

/// `quantity` from the request body, defaulting to 1. `None` unless it is
/// a whole number in `1..=MAX_LINE_QUANTITY`.
fn quantity(ctx: &RequestContext) -> Option<u32> {
    let quantity = match ctx.input("quantity") {
        None => 1,
        Some(raw) => raw.trim().parse::<i64>().ok()?,
    };
    u32::try_from(quantity)
        .ok()
        .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
}

fn bad_request(ctx: &mut RequestContext, message: &str) {
    ctx.json(StatusCode::BAD_REQUEST, json!({ "error": message }));
}

pub fn show(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let items = shop.db.cart_items(ctx.session_id())?;
    let totals = shop.totals(shop.db.cart_total(ctx.session_id())?);
    let content = views::cart_page(&ctx.url(""), &items, &totals);
    shop.render(ctx, "Shopping Cart", content);
    Ok(())
}

pub fn add(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let Some(product_id) = product_id(ctx) else {
        bad_request(ctx, "Product ID is required");
        return Ok(());
    };
    let Some(quantity) = quantity(ctx) else {
        bad_request(ctx, &format!("Quantity must be between 1 and {MAX_LINE_QUANTITY}"));
        return Ok(());
    };

    let Some(product) = shop.db.product(product_id)? else {
        ctx.json(StatusCode::NOT_FOUND, json!({ "error": "Product not found" }));
        return Ok(());
    };

    match shop.db.add_to_cart(ctx.session_id(), product_id, quantity) {
        Ok(()) => {}
        Err(StoreError::ProductNotFound(_)) => {
            ctx.json(StatusCode::NOT_FOUND, json!({ "error": "Product not found" }));
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    let item_count = shop.db.cart_item_count(ctx.session_id())?;
    tracing::debug!(request_id = %ctx.request_id(), product_id, quantity, item_count, "Added to cart");
    ctx.json(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "Product added to cart",
            "item_count": item_count,
            "product_name": product.name,
        }),
    );
    Ok(())
}

pub fn remove(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let Some(product_id) = product_id(ctx) else {
        bad_request(ctx, "Product ID is required");
        return Ok(());
    };

    shop.db.remove_from_cart(ctx.session_id(), product_id)?;
    let item_count = shop.db.cart_item_count(ctx.session_id())?;
    ctx.json(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "Product removed from cart",
            "item_count": item_count,
        }),
    );
    Ok(())
}

pub fn update(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let product_id = product_id(ctx);
    let quantity = quantity(ctx);
    let (Some(product_id), Some(quantity)) = (product_id, quantity) else {
        bad_request(ctx, "Product ID and valid quantity are required");
        return Ok(());
    };

    shop.db.update_cart_quantity(ctx.session_id(), product_id, quantity)?;
    let item_count = shop.db.cart_item_count(ctx.session_id())?;
    ctx.json(
        StatusCode::OK,
        json!({
            "success": true,
            "message": "Cart updated successfully",
            "item_count": item_count,
        }),
    );
    Ok(())
}

pub fn count(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let count = shop.db.cart_item_count(ctx.session_id())?;
    ctx.json(StatusCode::OK, json!({ "count": count }));
    Ok(())
}
