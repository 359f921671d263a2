//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (products reference existing categories)
//! - Validate value ranges (timeouts > 0, tax rate ≤ 100%)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("routing.base_path `{0}` must be empty or start with '/'")]
    BasePath(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("session.cookie_name `{0}` is not a valid cookie name")]
    CookieName(String),

    #[error("shop.tax_rate_bp {0} exceeds 10000")]
    TaxRate(u32),

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u64 },

    #[error("product {product} references unknown category {category}")]
    UnknownCategory { product: u64, category: u64 },
}

fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// Check semantic constraints, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_body_bytes"));
    }

    let base = &config.routing.base_path;
    if !base.is_empty() && !base.starts_with('/') {
        errors.push(ValidationError::BasePath(base.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if !is_cookie_token(&config.session.cookie_name) {
        errors.push(ValidationError::CookieName(config.session.cookie_name.clone()));
    }
    if config.session.idle_timeout_secs == 0 {
        errors.push(ValidationError::Zero("session.idle_timeout_secs"));
    }
    if config.session.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero("session.sweep_interval_secs"));
    }

    if config.shop.tax_rate_bp > 10_000 {
        errors.push(ValidationError::TaxRate(config.shop.tax_rate_bp));
    }
    if config.shop.min_password_len == 0 {
        errors.push(ValidationError::Zero("shop.min_password_len"));
    }

    let mut category_ids = HashSet::new();
    for category in &config.catalog.categories {
        if !category_ids.insert(category.id) {
            errors.push(ValidationError::DuplicateId {
                kind: "category",
                id: category.id,
            });
        }
    }

    let mut product_ids = HashSet::new();
    for product in &config.catalog.products {
        if !product_ids.insert(product.id) {
            errors.push(ValidationError::DuplicateId {
                kind: "product",
                id: product.id,
            });
        }
        if let Some(category) = product.category_id {
            if !category_ids.contains(&category) {
                errors.push(ValidationError::UnknownCategory {
                    product: product.id,
                    category,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
