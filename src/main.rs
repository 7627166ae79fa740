//! Storefront database service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ db guard ──▶ route handler
//!                                        │
//!                                        ▼
//!                              ┌────────────────────┐
//!                              │ ConnectionManager  │
//!                              │  single-flight     │
//!                              │  age + probe check │
//!                              │  retry + backoff   │
//!                              │  circuit breaker   │
//!                              └─────────┬──────────┘
//!                                        │
//!                                        ▼
//!                                 Driver (TcpDriver) ──▶ Database
//!
//!     Cross-cutting: config (toml + env), observability (tracing,
//!     prometheus), lifecycle (signals → graceful shutdown)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use storefront_db::config::load_config;
use storefront_db::connection::{redact_uri, ConnectionManager, TcpDriver};
use storefront_db::http::HttpServer;
use storefront_db::lifecycle::{spawn_signal_listener, Shutdown};
use storefront_db::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "storefront-db")]
#[command(about = "Storefront API with a resilient database connection", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults plus environment overrides apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!("storefront-db v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.server.bind_address,
        database = %redact_uri(&config.database.uri),
        max_retries = config.database.max_retries,
        breaker_threshold = config.database.breaker_threshold,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let driver = TcpDriver::new(config.database.max_pool_size);
    let manager = ConnectionManager::new(driver, config.database.clone());

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, manager);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
