//! Storefront server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum + tower-http layers)
//!                         │  body decoding, session load
//!                         ▼
//!                     routing::Router ──▶ route middleware (auth)
//!                         │
//!                         ▼
//!                     shop controllers ──▶ store::Database
//!                         │
//!                         ▼
//!     Client Response ◀── views (maud), JSON, redirects
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use storefront::config::{load_config, AppConfig};
use storefront::lifecycle::{wait_for_signal, Shutdown};
use storefront::observability::init_logging;
use storefront::{Database, HttpServer};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Online storefront server", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate configuration and route patterns, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        "storefront starting"
    );

    let db = Arc::new(Database::from_catalog(&config.catalog));

    let server = HttpServer::new(config, db);
    let broken = server.check_patterns();
    if !broken.is_empty() {
        for err in &broken {
            tracing::error!(pattern = %err.pattern, reason = %err.reason, "Invalid route pattern");
        }
        return Err(format!("{} route pattern(s) failed to compile", broken.len()).into());
    }
    if args.check {
        tracing::info!("Configuration OK");
        return Ok(());
    }

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
