//! # Price Lookup
//!
//! Cache-aside pricing. Cached ids answer immediately. Any other id pays a
//! simulated computation delay and gets a random price.

use bulkhead_framework::SharedTracer;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::cache::PriceCache;
use crate::config::PriceConfig;

/// Miss-path policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissPolicy {
    pub delay: Duration,
    pub min: i64,
    pub max: i64,
    pub partition_threshold: i32,
}

impl Default for MissPolicy {
    fn default() -> Self {
        Self::from(&PriceConfig::default())
    }
}

impl From<&PriceConfig> for MissPolicy {
    fn from(config: &PriceConfig) -> Self {
        Self {
            delay: config.miss_delay,
            min: config.min,
            max: config.max,
            partition_threshold: config.partition_threshold,
        }
    }
}

impl MissPolicy {
    /// Partition label for `id`.
    pub fn cluster(&self, id: i32) -> &'static str {
        if id < self.partition_threshold {
            "cluster1"
        } else {
            "cluster2"
        }
    }
}

pub struct PriceService {
    cache: Arc<PriceCache>,
    tracer: SharedTracer,
    policy: MissPolicy,
}

impl PriceService {
    pub fn new(cache: Arc<PriceCache>, tracer: SharedTracer, policy: MissPolicy) -> Self {
        Self {
            cache,
            tracer,
            policy,
        }
    }

    /// Price of catalog `id`.
    ///
    /// A miss is **not** written back: every miss for the same id pays the delay again
    /// and may return a different value. The cache only ever holds its startup entries.
    #[instrument(skip(self))]
    pub async fn price(&self, id: i32) -> Decimal {
        if let Some(price) = self.cache.get(id) {
            debug!("Cache hit");
            return price;
        }

        self.tracer.tag("cluster", self.policy.cluster(id));
        self.tracer.event("cache.miss");

        tokio::time::sleep(self.policy.delay).await;
        self.tracer
            .tag("calculation.time", &format!("{} ms", self.policy.delay.as_millis()));

        let (low, high) = (self.policy.min.min(self.policy.max), self.policy.max.max(self.policy.min));
        let value = rand::thread_rng().gen_range(low..=high);
        debug!(value, "Computed price");
        Decimal::from(value)
    }
}
