//! Storefront controllers and route table.
//!
//! # Responsibilities
//! - Register every storefront route on a [`Router`]
//! - Translate store results into pages, JSON and redirects
//! - Map a store outage to a 503 page (HTML routes) or 503 JSON (API routes)
//!
//! # Design Decisions
//! - Controllers are plain functions over `(&Shop, &mut RequestContext, &PathParams)`
//! - Controllers propagate store errors with `?`; [`bind`] turns an outage
//!   into a response and lets anything else surface as a handler failure

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod views;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use crate::auth::AuthMiddleware;
use crate::config::ShopConfig;
use crate::http::context::RequestContext;
use crate::routing::{middleware, Handler, HandlerError, PathParams, Router};
use crate::store::{Database, Money, StoreError};

use views::Chrome;

/// Shared state for every controller.
pub struct Shop {
    pub db: Arc<Database>,
    pub settings: ShopConfig,
}

/// Signature shared by all controllers.
pub type Action = fn(&Shop, &mut RequestContext, &PathParams) -> Result<(), HandlerError>;

/// Which outage response a route produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Page,
    Json,
}

/// Order summary amounts shown on the cart and checkout pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl Shop {
    pub fn new(db: Arc<Database>, settings: ShopConfig) -> Self {
        Self { db, settings }
    }

    /// Header/nav data for the page layout. An unavailable cart count shows as zero.
    pub fn chrome<'a>(&'a self, ctx: &'a RequestContext) -> Chrome<'a> {
        Chrome {
            app_name: &self.settings.app_name,
            base: ctx.url(""),
            user: ctx.session.display_name.as_deref(),
            cart_count: self.db.cart_item_count(ctx.session_id()).unwrap_or(0),
        }
    }

    /// Subtotal plus flat shipping and tax.
    pub fn totals(&self, subtotal: Money) -> Totals {
        let shipping = self.settings.shipping_flat;
        let tax = subtotal.basis_points(self.settings.tax_rate_bp);
        Totals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Render `content` inside the site layout.
    pub fn render(&self, ctx: &mut RequestContext, title: &str, content: maud::Markup) {
        let page = views::layout(&self.chrome(ctx), title, content);
        ctx.html(page);
    }

    /// Render an error page with `status`.
    pub fn error_page(&self, ctx: &mut RequestContext, status: StatusCode, message: &str) {
        let content = views::error(status, message, &ctx.url("/"));
        self.render(ctx, status.canonical_reason().unwrap_or("Error"), content);
        ctx.set_status(status);
    }

    fn outage(&self, ctx: &mut RequestContext, surface: Surface) {
        match surface {
            Surface::Page => self.error_page(
                ctx,
                StatusCode::SERVICE_UNAVAILABLE,
                "The store is temporarily unavailable. Please try again later.",
            ),
            Surface::Json => ctx.json(
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "Store is temporarily unavailable" }),
            ),
        }
    }
}

/// Parse a numeric path parameter captured by `\d+`.
pub fn id_param(params: &PathParams, name: &str) -> Option<u64> {
    params.get(name).and_then(|raw| raw.parse().ok())
}

/// Wrap an action into a router handler.
pub fn bind(shop: &Arc<Shop>, surface: Surface, action: Action) -> impl Handler + 'static {
    let shop = Arc::clone(shop);
    move |ctx: &mut RequestContext, params: &PathParams| -> Result<(), HandlerError> {
        match action(&shop, ctx, params) {
            Err(err) if matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NotConnected)) => {
                tracing::error!(request_id = %ctx.request_id(), path = %ctx.path(), "Store unavailable");
                shop.outage(ctx, surface);
                Ok(())
            }
            other => other,
        }
    }
}

/// Build the storefront route table.
pub fn routes(shop: Arc<Shop>, base_path: &str) -> Router {
    use Surface::{Json, Page};

    let mut router = Router::with_base_path(base_path);
    let auth = || middleware(AuthMiddleware);

    router.get("/", bind(&shop, Page, catalog::home), Vec::new());
    router.get("/products", bind(&shop, Page, catalog::index), Vec::new());
    router.get(r"/product/{id:\d+}", bind(&shop, Page, catalog::show), Vec::new());
    router.get("/categories", bind(&shop, Page, catalog::categories), Vec::new());
    router.get(r"/category/{id:\d+}", bind(&shop, Page, catalog::category), Vec::new());
    router.get("/api/products/search", bind(&shop, Json, catalog::search), Vec::new());

    router.get("/cart", bind(&shop, Page, cart::show), Vec::new());
    router.post("/cart/add", bind(&shop, Json, cart::add), Vec::new());
    router.post("/cart/remove", bind(&shop, Json, cart::remove), Vec::new());
    router.post("/cart/update", bind(&shop, Json, cart::update), Vec::new());
    router.get("/api/cart/count", bind(&shop, Json, cart::count), Vec::new());

    router.get("/checkout", bind(&shop, Page, orders::checkout), auth());
    router.post("/order/create", bind(&shop, Json, orders::create), Vec::new());
    router.get("/orders", bind(&shop, Page, orders::index), auth());
    router.get(r"/order/{id:\d+}", bind(&shop, Page, orders::show), auth());

    router.get("/login", bind(&shop, Page, account::show_login), Vec::new());
    router.post("/login", bind(&shop, Page, account::login), Vec::new());
    router.get("/register", bind(&shop, Page, account::show_register), Vec::new());
    router.post("/register", bind(&shop, Page, account::register), Vec::new());
    router.get("/logout", bind(&shop, Page, account::logout), Vec::new());

    router
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::fixtures;

    pub fn shop() -> Arc<Shop> {
        Arc::new(Shop::new(Arc::new(fixtures::database()), ShopConfig::default()))
    }

    pub fn offline_shop() -> Arc<Shop> {
        Arc::new(Shop::new(Arc::new(Database::disconnected()), ShopConfig::default()))
    }

    pub fn request(method: axum::http::Method, path: &str) -> RequestContext {
        RequestContext::new(method, path).with_session("visitor", Default::default())
    }

    pub fn body_json(ctx: &RequestContext) -> serde_json::Value {
        serde_json::from_str(&ctx.reply().body).unwrap()
    }
}
