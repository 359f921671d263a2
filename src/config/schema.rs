//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the storefront.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::store::{Category, Money, Product};

/// Root configuration for the storefront.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// URL routing settings.
    pub routing: RoutingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Shop presentation and pricing rules.
    pub shop: ShopConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Catalog loaded into the store at startup.
    pub catalog: CatalogConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// Prefix the app is mounted under (e.g., "/shop"). Empty for root.
    pub base_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the session id.
    pub cookie_name: String,

    /// Add the `Secure` attribute (HTTPS deployments).
    pub secure_cookie: bool,

    /// Sessions idle longer than this are dropped, along with their carts.
    pub idle_timeout_secs: u64,

    /// How often idle sessions are swept.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "storefront_session".to_string(),
            secure_cookie: false,
            idle_timeout_secs: 2 * 60 * 60,
            sweep_interval_secs: 60,
        }
    }
}

/// Shop rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Name shown in the page header.
    pub app_name: String,

    /// Flat shipping charge in cents.
    pub shipping_flat: Money,

    /// Sales tax in basis points (800 = 8%).
    pub tax_rate_bp: u32,

    /// Minimum password length at registration.
    pub min_password_len: usize,

    /// Products shown on the home page.
    pub home_product_limit: usize,

    /// Default `limit` for the search API.
    pub search_default_limit: usize,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            app_name: "Rust Storefront".to_string(),
            shipping_flat: Money::from_cents(2_000),
            tax_rate_bp: 800,
            min_password_len: 6,
            home_product_limit: 8,
            search_default_limit: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g., "info" or "storefront=debug,tower_http=info").
    pub log_level: String,

    /// Human-readable or JSON lines.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "storefront=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Catalog data.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// When false the store starts disconnected and every page reports an
    /// outage. Useful for exercising error paths.
    pub connected: bool,

    pub categories: Vec<Category>,

    pub products: Vec<Product>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            connected: true,
            categories: Vec::new(),
            products: Vec::new(),
        }
    }
}
