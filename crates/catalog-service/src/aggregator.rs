//! # Catalog Aggregation
//!
//! [`CatalogService::aggregate`] answers one catalog request:
//!
//! 1. price lookup (`pricing` boundary)
//! 2. products lookup (`products` boundary)
//! 3. schedule the notification email, not awaited
//! 4. maybe pause the request, simulating a stop-the-world collection
//! 5. submit post-processing to the single-slot processor, not awaited
//! 6. assemble the [`Catalog`]
//!
//! The lookups run in that order and either failure aborts the request with
//! [`AggregationError`]. Nothing after step 2 can fail the request.

use bulkhead_framework::{BackgroundExecutor, CircuitState, DependencyError, IsolatedCaller, SharedTracer};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::clients::{PriceClient, ProductsClient};
use crate::model::{Catalog, CatalogId};
use crate::notifier::Notifier;

/// Name of the single-worker post-processing executor.
pub const PROCESSOR: &str = "catalog-processor";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("price lookup failed: {0}")]
    Price(#[source] DependencyError),
    #[error("products lookup failed: {0}")]
    Products(#[source] DependencyError),
}

impl AggregationError {
    pub fn cause(&self) -> &DependencyError {
        match self {
            Self::Price(e) | Self::Products(e) => e,
        }
    }
}

/// Timing knobs of the request path.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSettings {
    /// Chance that a request is paused, in `[0, 1]`.
    pub pause_probability: f64,
    pub pause: Duration,
    /// How long the post-processing step takes.
    pub processing: Duration,
    /// Post-processing jobs allowed to wait for the single processor worker.
    pub processor_queue: usize,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            pause_probability: 0.5,
            pause: Duration::from_secs(3),
            processing: Duration::from_millis(100),
            processor_queue: 10_000,
        }
    }
}

pub struct CatalogService {
    price: PriceClient,
    products: ProductsClient,
    notifier: Notifier,
    processor: BackgroundExecutor,
    tracer: SharedTracer,
    settings: AggregationSettings,
}

impl CatalogService {
    /// Must be called from within a Tokio runtime; spawns the processor worker.
    pub fn new(
        price: PriceClient,
        products: ProductsClient,
        notifier: Notifier,
        tracer: SharedTracer,
        settings: AggregationSettings,
    ) -> Self {
        Self {
            price,
            products,
            notifier,
            processor: BackgroundExecutor::new(PROCESSOR, 1, settings.processor_queue),
            tracer,
            settings,
        }
    }

    #[instrument(skip(self))]
    pub async fn aggregate(&self, id: CatalogId) -> Result<Catalog, AggregationError> {
        self.tracer.event("price.fetch");
        let price = self
            .price
            .get_price(id)
            .await
            .map_err(AggregationError::Price)?;

        self.tracer.event("products.fetch");
        let products = self
            .products
            .get_products(id)
            .await
            .map_err(AggregationError::Products)?;

        self.tracer.event("email.send");
        self.notifier.notify_async();

        self.maybe_pause().await;
        self.submit_processing(id);

        Ok(Catalog::new(id, price, products))
    }

    async fn maybe_pause(&self) {
        let triggered = rand::thread_rng().gen_bool(self.settings.pause_probability.clamp(0.0, 1.0));
        if triggered {
            tokio::time::sleep(self.settings.pause).await;
            self.tracer.event("gc.full");
        }
    }

    fn submit_processing(&self, id: CatalogId) {
        let processing = self.settings.processing;
        let submitted = self.processor.submit(async move {
            info!(%id, "Processing ...");
            tokio::time::sleep(processing).await;
            info!(%id, "Processed");
            Ok(())
        });
        if let Err(e) = submitted {
            warn!(%id, error = %e, "Post-processing skipped");
        }
    }

    /// Breaker states of the `(pricing, products)` boundaries.
    pub fn circuit_states(&self) -> (CircuitState, CircuitState) {
        (
            self.price.inner().circuit_state(),
            self.products.inner().circuit_state(),
        )
    }

    /// Stop both background executors. Work still running after `drain` is aborted.
    pub async fn shutdown(&self, drain: Duration) {
        tokio::join!(self.notifier.shutdown(drain), self.processor.shutdown(drain));
    }
}
