//! Product and category pages, plus the product search API.

use axum::http::StatusCode;
use serde_json::json;

use crate::http::context::RequestContext;
use crate::routing::{HandlerError, PathParams};
use crate::store::{Money, Product};

use super::views::{self, ProductFilters};
use super::{id_param, Shop};

pub fn home(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let products = shop.db.products(Some(shop.settings.home_product_limit))?;
    let categories = shop.db.categories()?;
    let content = views::home(&ctx.url(""), &products, &categories);
    shop.render(ctx, "Home", content);
    Ok(())
}

/// Sort a product list by one of the `/products` sort keys. Unknown keys
/// keep the store's newest-first order.
fn sort_products(products: &mut [Product], sort: &str) {
    match sort {
        "price_low" => products.sort_by_key(|p| p.price),
        "price_high" => products.sort_by(|a, b| b.price.cmp(&a.price)),
        "name" => products.sort_by(|a, b| a.name.cmp(&b.name)),
        _ => {}
    }
}

/// Keep products priced within the optional bounds. Unparseable bounds are ignored.
fn filter_by_price(products: Vec<Product>, min: Option<Money>, max: Option<Money>) -> Vec<Product> {
    products
        .into_iter()
        .filter(|p| min.map_or(true, |min| p.price >= min) && max.map_or(true, |max| p.price <= max))
        .collect()
}

pub fn index(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let search = ctx.query("search").filter(|s| !s.is_empty()).map(str::to_string);
    let category = ctx.query("category").and_then(|c| c.parse::<u64>().ok());
    let sort = ctx.query("sort").unwrap_or("newest").to_string();

    let products = match (&search, category) {
        (Some(term), _) => shop.db.search_products(term, None)?,
        (None, Some(category)) => shop.db.products_in_category(category)?,
        (None, None) => shop.db.products(None)?,
    };

    let min = ctx.query("min_price").and_then(Money::parse);
    let max = ctx.query("max_price").and_then(Money::parse);
    let mut products = filter_by_price(products, min, max);
    sort_products(&mut products, &sort);

    let filters = ProductFilters {
        search: search.as_deref(),
        sort: &sort,
    };
    let content = views::product_list(&ctx.url(""), &products, &filters);
    shop.render(ctx, "Products", content);
    Ok(())
}

pub fn show(shop: &Shop, ctx: &mut RequestContext, params: &PathParams) -> Result<(), HandlerError> {
    let product = match id_param(params, "id") {
        Some(id) => shop.db.product(id)?,
        None => None,
    };
    let Some(product) = product else {
        ctx.not_found();
        return Ok(());
    };

    let content = views::product_page(&ctx.url(""), &product);
    shop.render(ctx, &product.name, content);
    Ok(())
}

pub fn categories(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let categories = shop.db.categories()?;
    let content = views::category_list(&ctx.url(""), &categories);
    shop.render(ctx, "Categories", content);
    Ok(())
}

pub fn category(shop: &Shop, ctx: &mut RequestContext, params: &PathParams) -> Result<(), HandlerError> {
    let category = match id_param(params, "id") {
        Some(id) => shop.db.category(id)?,
        None => None,
    };
    let Some(category) = category else {
        ctx.not_found();
        return Ok(());
    };

    let subcategories = shop.db.subcategories(category.id)?;
    let products = shop.db.products_in_category(category.id)?;
    let content = views::category_page(&ctx.url(""), &category, &subcategories, &products);
    shop.render(ctx, &category.name, content);
    Ok(())
}

/// `GET /api/products/search?q=term&limit=n`
pub fn search(shop: &Shop, ctx: &mut RequestContext, _params: &PathParams) -> Result<(), HandlerError> {
    let Some(term) = ctx.query("q").map(str::to_string) else {
        ctx.json(StatusCode::BAD_REQUEST, json!({ "error": "Invalid request" }));
        return Ok(());
    };
    let limit = ctx
        .query("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(shop.settings.search_default_limit);

    let results = shop.db.search_products(&term, Some(limit))?;
    ctx.json(StatusCode::OK, json!({ "count": results.len(), "results": results }));
    Ok(())
}
