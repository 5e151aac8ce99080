//! # System Lifecycle & Orchestration
//!
//! This module wires the gateway together and takes it apart again.
//!
//! ## The CatalogSystem Pattern
//!
//! ```rust,ignore
//! impl CatalogSystem {
//!     pub fn new(config) -> Self {
//!         // 1. Create both boundaries (no context yet)
//!         let (price_bulkhead, price_client) = Bulkhead::<PriceLookup>::new(config.bulkhead(PRICING));
//!         let (products_bulkhead, products_client) = Bulkhead::<ProductsLookup>::new(config.bulkhead(PRODUCTS));
//!
//!         // 2. Start them with their HTTP endpoints injected
//!         let price_handle = tokio::spawn(price_bulkhead.run(price_endpoint));
//!         let products_handle = tokio::spawn(products_bulkhead.run(products_endpoint));
//!
//!         // 3. Compose the service from the typed clients
//!         let service = CatalogService::new(price_client, products_client, notifier, tracer, settings);
//!         ...
//!     }
//! }
//! ```
//!
//! ## Graceful Shutdown
//!
//! 1. **Stop background work** - notifier and processor refuse new tasks, drain for
//!    at most `shutdown_drain`, then abort what is left
//! 2. **Drop the service** - releases the last clients, closing both bulkhead queues
//! 3. **Bulkheads finish** - in-flight calls complete (each is bounded by its timeout)
//! 4. **Await completion** - bounded by `shutdown_drain` as well
//!
//! Step 2 only closes the queues when no other handle to the service is alive, so
//! stop the HTTP server first.

use bulkhead_framework::{Bulkhead, SharedTracer};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::aggregator::{AggregationSettings, CatalogService};
use crate::clients::{HttpEndpoint, PriceClient, PriceLookup, ProductsClient, ProductsLookup};
use crate::config::{GatewayConfig, PRICING, PRODUCTS};
use crate::notifier::Notifier;

/// The running gateway.
pub struct CatalogSystem {
    pub service: Arc<CatalogService>,
    handles: Vec<JoinHandle<()>>,
    drain: Duration,
}

impl CatalogSystem {
    /// Starts both isolation boundaries and both background executors.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &GatewayConfig, tracer: SharedTracer) -> Result<Self, reqwest::Error> {
        let price_endpoint = HttpEndpoint::new(PRICING, &config.price_url, config.dependency_timeout)?;
        let products_endpoint =
            HttpEndpoint::new(PRODUCTS, &config.products_url, config.dependency_timeout)?;

        let (price_bulkhead, price_client) = Bulkhead::<PriceLookup>::new(config.bulkhead(PRICING));
        let (products_bulkhead, products_client) =
            Bulkhead::<ProductsLookup>::new(config.bulkhead(PRODUCTS));

        let price_handle = tokio::spawn(price_bulkhead.run(price_endpoint));
        let products_handle = tokio::spawn(products_bulkhead.run(products_endpoint));

        let notifier = Notifier::new(tracer.clone(), config.notify_delay);
        let service = CatalogService::new(
            PriceClient::new(price_client),
            ProductsClient::new(products_client),
            notifier,
            tracer,
            AggregationSettings {
                pause_probability: config.pause_probability,
                pause: config.pause,
                processing: config.processing,
                processor_queue: config.processor_queue,
            },
        );
        info!(price_url = %config.price_url, products_url = %config.products_url, "Catalog system started");

        Ok(Self {
            service: Arc::new(service),
            handles: vec![price_handle, products_handle],
            drain: config.shutdown_drain,
        })
    }

    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown");
        self.service.shutdown(self.drain).await;

        // Drop the service (and its clients) so the bulkheads see their queues close
        drop(self.service);

        let handles = self.handles;
        let joined = tokio::time::timeout(self.drain, async {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Bulkhead task ended abnormally");
                }
            }
        })
        .await;
        if joined.is_err() {
            warn!("Bulkheads still busy after drain timeout");
        }
        info!("Shutdown complete");
    }
}
