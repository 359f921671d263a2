//! Storefront library: a regex route table with per-route middleware,
//! and the shop built on top of it.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Shop
pub mod auth;
pub mod session;
pub mod shop;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::Database;
