//! Checkout, order placement and order history.

use axum::http::StatusCode;
use serde_json::json;

use crate::http::context::RequestContext;
use crate::routing::{HandlerError, PathParams};
use crate::store::{NewOrder, StoreError};

use super::{id_param, views, Shop};

const DEFAULT_PAYMENT_METHOD: &str = "credit_card";

/// Non-blank body field.
fn field(ctx: &RequestContext, name: &str) -> Option<String> {
    ctx.input(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn checkout(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let items = shop.db.cart_items(ctx.session_id())?;
    if items.is_empty() {
        let cart = ctx.url("/cart");
        ctx.redirect(&cart);
        return Ok(());
    }

    let totals = shop.totals(items.iter().map(|item| item.line_total()).sum());
    let content = views::checkout_page(&ctx.url(""), &items, &totals);
    shop.render(ctx, "Checkout", content);
    Ok(())
}

/// `POST /order/create`: turn the session cart into an order.
pub fn create(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let Some(user_id) = ctx.session.user_id else {
        ctx.json(
            StatusCode::UNAUTHORIZED,
            json!({ "error": "You must be logged in to place an order" }),
        );
        return Ok(());
    };

    let items = shop.db.cart_items(ctx.session_id())?;
    if items.is_empty() {
        ctx.json(StatusCode::BAD_REQUEST, json!({ "error": "Cart is empty" }));
        return Ok(());
    }
    let Some(shipping_address) = field(ctx, "shipping_address") else {
        ctx.json(StatusCode::BAD_REQUEST, json!({ "error": "Shipping address is required" }));
        return Ok(());
    };
    let billing_address = field(ctx, "billing_address").unwrap_or_else(|| shipping_address.clone());
    let payment_method = field(ctx, "payment_method").unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

    let placed = shop.db.create_order(NewOrder {
        user_id,
        items: &items,
        shipping_address,
        billing_address,
        payment_method,
    });

    match placed {
        Ok(order_id) => {
            shop.db.clear_cart(ctx.session_id())?;
            tracing::info!(request_id = %ctx.request_id(), user_id, order_id, "Order placed");
            ctx.json(
                StatusCode::OK,
                json!({
                    "success": true,
                    "message": "Order created successfully",
                    "order_id": order_id,
                }),
            );
        }
        Err(StoreError::InsufficientStock { product_id }) => {
            tracing::warn!(request_id = %ctx.request_id(), user_id, product_id, "Order failed: insufficient stock");
            ctx.json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to create order - please check product availability and try again" }),
            );
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub fn index(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let Some(user_id) = ctx.session.user_id else {
        ctx.not_found();
        return Ok(());
    };
    let orders = shop.db.orders_for_user(user_id)?;
    let content = views::order_list(&ctx.url(""), &orders);
    shop.render(ctx, "Order History", content);
    Ok(())
}

pub fn show(shop: &Shop, ctx: &mut RequestContext, params: &PathParams) -> Result<(), HandlerError> {
    let order = match id_param(params, "id") {
        Some(id) => shop.db.order(id)?,
        None => None,
    };
    let Some(order) = order else {
        ctx.not_found();
        return Ok(());
    };
    if ctx.session.user_id != Some(order.user_id) {
        tracing::warn!(request_id = %ctx.request_id(), order_id = order.id, "Order viewed by another customer");
        shop.error_page(ctx, StatusCode::FORBIDDEN, "You do not have permission to view this order.");
        return Ok(());
    }

    let lines = shop.db.order_lines(order.id)?;
    let content = views::order_page(&order, &lines);
    shop.render(ctx, &format!("Order #{}", order.id), content);
    Ok(())
}
