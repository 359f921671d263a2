//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use crate::store::Money;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert_eq!(config.shop.tax_rate_bp, 800);
        assert!(config.catalog.connected);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "0.0.0.0:9000"

            [routing]
            base_path = "/shop"

            [shop]
            shipping_flat = 995

            [observability]
            log_format = "json"

            [[catalog.categories]]
            id = 1
            name = "Books"

            [[catalog.products]]
            id = 10
            category_id = 1
            name = "Rust Book"
            price = 3999
            stock_quantity = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.routing.base_path, "/shop");
        assert_eq!(config.shop.shipping_flat, Money::from_cents(995));
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.catalog.products[0].price, Money::from_cents(3_999));
        assert_eq!(config.catalog.products[0].description, "");
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = parse_config(include_str!("../../storefront.example.toml")).unwrap();
        assert_eq!(config.catalog.products.len(), 3);
        assert_eq!(config.catalog.categories[1].parent_id, Some(1));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("listener = 5"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error_lists_problems() {
        let err = parse_config("[timeouts]\nrequest_secs = 0\n").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: timeouts.request_secs must be greater than zero");
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
