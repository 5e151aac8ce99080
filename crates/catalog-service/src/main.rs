//! # Catalog Gateway
//!
//! Serves `GET /{id}` by combining the price and products downstreams, each behind its
//! own bulkhead and circuit breaker.
//!
//! ## Components
//!
//! - **[clients](catalog_service::clients)**: typed [`PriceClient`](catalog_service::clients::PriceClient) and
//!   [`ProductsClient`](catalog_service::clients::ProductsClient) over isolated boundaries.
//! - **[aggregator](catalog_service::aggregator)**: the request path, [`CatalogService`](catalog_service::aggregator::CatalogService).
//! - **[lifecycle](catalog_service::lifecycle)**: wiring and ordered shutdown.
//!
//! ## Running
//!
//! ```bash
//! CATALOG_PRICE_URL=http://localhost:8070 RUST_LOG=info cargo run -p catalog-service
//! ```

use anyhow::Context;
use bulkhead_framework::tracing::setup_tracing;
use bulkhead_framework::LogTracer;
use catalog_service::config::GatewayConfig;
use catalog_service::http::router;
use catalog_service::lifecycle::CatalogSystem;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env().context("loading gateway configuration")?;

    // Setup tracing once for the entire application
    setup_tracing(&config.logging);

    let system = CatalogSystem::new(&config, Arc::new(LogTracer)).context("starting catalog system")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!(bind_address = %config.bind_address, "Catalog gateway listening");

    axum::serve(listener, router(system.service.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    system.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
