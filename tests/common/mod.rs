//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use storefront::config::{AppConfig, CatalogConfig};
use storefront::store::{Category, Money, Product};
use storefront::{Database, HttpServer, Shutdown};
use tokio::net::TcpListener;

/// A running server on an ephemeral port. Dropping it stops the server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub db: Arc<Database>,
    pub base_path: String,
    _shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}{}", self.addr, self.base_path, path)
    }
}

fn product(id: u64, category_id: u64, name: &str, cents: u64, stock: u32) -> Product {
    Product {
        id,
        category_id: Some(category_id),
        name: name.to_string(),
        description: format!("A fine {}", name.to_lowercase()),
        price: Money::from_cents(cents),
        stock_quantity: stock,
        image_url: None,
    }
}

fn category(id: u64, name: &str, parent_id: Option<u64>) -> Category {
    Category {
        id,
        name: name.to_string(),
        description: String::new(),
        parent_id,
    }
}

pub fn catalog() -> CatalogConfig {
    CatalogConfig {
        connected: true,
        categories: vec![category(1, "Electronics", None), category(2, "Books", None)],
        products: vec![
            product(1, 1, "Laptop", 129_999, 5),
            product(2, 2, "Rust Book", 3_999, 2),
        ],
    }
}

/// Start a server with the test catalog.
#[allow(dead_code)]
pub async fn spawn_app() -> TestApp {
    let mut config = AppConfig::default();
    config.catalog = catalog();
    spawn_with(config).await
}

/// Start a server with `config`.
pub async fn spawn_with(config: AppConfig) -> TestApp {
    let db = Arc::new(Database::from_catalog(&config.catalog));
    let base_path = config.routing.base_path.clone();
    let server = HttpServer::new(config, Arc::clone(&db));
    assert!(server.check_patterns().is_empty());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestApp {
        addr,
        db,
        base_path,
        _shutdown: shutdown,
    }
}

/// A browser-like client: keeps cookies, does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
