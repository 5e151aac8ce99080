//! # Price Service
//!
//! ```bash
//! RUST_LOG=info cargo run -p price-service
//! curl localhost:8070/1   # "100"
//! ```

use anyhow::Context;
use bulkhead_framework::tracing::setup_tracing;
use bulkhead_framework::LogTracer;
use price_service::cache::PriceCache;
use price_service::config::PriceConfig;
use price_service::http::router;
use price_service::service::{MissPolicy, PriceService};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PriceConfig::from_env().context("loading price service configuration")?;
    setup_tracing(&config.logging);

    let cache = Arc::new(PriceCache::seeded());
    info!(entries = cache.len(), "Price cache seeded");
    let service = Arc::new(PriceService::new(cache, Arc::new(LogTracer), MissPolicy::from(&config)));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!(bind_address = %config.bind_address, "Price service listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("serving HTTP")?;

    info!("Price service stopped");
    Ok(())
}
