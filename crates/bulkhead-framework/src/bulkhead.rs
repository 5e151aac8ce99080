//! # Bulkhead Pool
//!
//! This module defines the `Bulkhead`, the server half of an isolation boundary. It owns
//! the receiving end of the boundary's bounded queue and a fixed number of permits, and
//! runs each admitted call on its own Tokio task.
//!
//! # Architecture Note
//! Every downstream gets its own `Bulkhead`. Calls to the price service can exhaust the
//! `pricing` permits and fill the `pricing` queue, but they never touch the `products`
//! permits. Once a queue is full, the client side rejects new calls immediately instead
//! of letting request tasks pile up behind a stalled dependency.
//!
//! # Usage Pattern
//!
//! 1.  **Create**: `Bulkhead::new(config)` returns the `bulkhead` (server) and `client`.
//! 2.  **Wire**: pass the dependency context into `bulkhead.run(context)`.
//! 3.  **Run**: spawn the run loop in a background task.
//!
//! ```rust
//! use async_trait::async_trait;
//! use bulkhead_framework::{Bulkhead, BulkheadConfig, Dependency, DependencyError};
//!
//! struct Doubler;
//!
//! #[async_trait]
//! impl Dependency for Doubler {
//!     type Id = u32;
//!     type Output = u32;
//!     type Context = ();
//!
//!     async fn fetch(id: u32, _: &()) -> Result<u32, DependencyError> {
//!         Ok(id * 2)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (bulkhead, client) = Bulkhead::<Doubler>::new(BulkheadConfig::named("doubler"));
//!     tokio::spawn(bulkhead.run(()));
//!
//!     assert_eq!(client.call(21).await.unwrap(), 42);
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::breaker::{BreakerConfig, CircuitBreaker};
use crate::client::IsolatedClient;
use crate::dependency::Dependency;
use crate::error::DependencyError;
use crate::message::CallRequest;

/// Sizing and failure policy of one isolation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkheadConfig {
    pub name: String,
    /// Calls allowed to run against the dependency at the same time.
    pub max_concurrency: usize,
    /// Calls allowed to wait for a permit. Must be at least 1.
    pub queue_capacity: usize,
    /// Upper bound for one call, queue wait included.
    pub timeout: Duration,
    pub breaker: BreakerConfig,
}

impl BulkheadConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_concurrency: 10,
            queue_capacity: 5,
            timeout: Duration::from_secs(1),
            breaker: BreakerConfig::default(),
        }
    }
}

pub struct Bulkhead<D: Dependency> {
    name: Arc<str>,
    receiver: mpsc::Receiver<CallRequest<D>>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl<D: Dependency> Bulkhead<D> {
    /// Creates a new `Bulkhead` and the `IsolatedClient` that feeds it.
    ///
    /// The client is cheap to clone; every clone shares the same queue and breaker.
    pub fn new(config: BulkheadConfig) -> (Self, IsolatedClient<D>) {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let breaker = Arc::new(CircuitBreaker::new(config.name.clone(), config.breaker.clone()));
        let name: Arc<str> = Arc::from(config.name.as_str());
        let bulkhead = Self {
            name: name.clone(),
            receiver,
            permits: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            timeout: config.timeout,
        };
        let client = IsolatedClient::new(name, sender, breaker, config.timeout);
        (bulkhead, client)
    }

    /// Runs the dispatch loop until every client has been dropped.
    ///
    /// # Context Injection
    /// The `context` is shared by all worker tasks of this boundary and by nothing else.
    pub async fn run(mut self, context: D::Context) {
        let dependency = self.name.clone();
        let context = Arc::new(context);
        let mut in_flight = JoinSet::new();
        info!(%dependency, permits = self.permits.available_permits(), "Bulkhead started");

        while let Some(CallRequest { id, respond_to }) = self.receiver.recv().await {
            // waits here when the pool is saturated; the queue absorbs the backlog
            let Ok(permit) = self.permits.clone().acquire_owned().await else {
                break;
            };
            if respond_to.is_closed() {
                debug!(%dependency, %id, "Caller gave up while queued");
                continue;
            }

            let ctx = context.clone();
            let name = dependency.clone();
            let timeout = self.timeout;
            in_flight.spawn(async move {
                let _permit = permit;
                debug!(dependency = %name, %id, "Call");
                let result = match tokio::time::timeout(timeout, D::fetch(id.clone(), &ctx)).await {
                    Ok(result) => result,
                    Err(_) => Err(DependencyError::Timeout(name.to_string())),
                };
                if let Err(e) = &result {
                    warn!(dependency = %name, %id, error = %e, "Call failed");
                }
                let _ = respond_to.send(result);
            });

            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        info!(%dependency, "Shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnavailableReason;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sleeps for `id` milliseconds and counts concurrent executions.
    struct Sleeper;

    #[derive(Default)]
    struct Gauge {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Dependency for Sleeper {
        type Id = u64;
        type Output = u64;
        type Context = Arc<Gauge>;

        async fn fetch(id: u64, gauge: &Arc<Gauge>) -> Result<u64, DependencyError> {
            let now = gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
            gauge.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(id)).await;
            gauge.current.fetch_sub(1, Ordering::SeqCst);
            Ok(id)
        }
    }

    fn config(max_concurrency: usize, queue_capacity: usize, timeout_ms: u64) -> BulkheadConfig {
        BulkheadConfig {
            max_concurrency,
            queue_capacity,
            timeout: Duration::from_millis(timeout_ms),
            ..BulkheadConfig::named("sleeper")
        }
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_permits() {
        let gauge = Arc::new(Gauge::default());
        let (bulkhead, client) = Bulkhead::<Sleeper>::new(config(2, 10, 2_000));
        let handle = tokio::spawn(bulkhead.run(gauge.clone()));

        let mut calls = vec![];
        for _ in 0..6 {
            let client = client.clone();
            calls.push(tokio::spawn(async move { client.call(30).await }));
        }
        for call in calls {
            assert_eq!(call.await.unwrap().unwrap(), 30);
        }

        assert_eq!(gauge.peak.load(Ordering::SeqCst), 2);
        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_full_queue_rejects_immediately() {
        let gauge = Arc::new(Gauge::default());
        let (bulkhead, client) = Bulkhead::<Sleeper>::new(config(1, 1, 5_000));
        tokio::spawn(bulkhead.run(gauge));

        // one call running, one held by the dispatcher, one queued
        let mut calls = vec![];
        for _ in 0..3 {
            let client = client.clone();
            calls.push(tokio::spawn(async move { client.call(300).await }));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let err = client.call(300).await.unwrap_err();
        assert_eq!(
            err,
            DependencyError::unavailable("sleeper", UnavailableReason::PoolRejected)
        );
        for call in calls {
            assert!(call.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let gauge = Arc::new(Gauge::default());
        let (bulkhead, client) = Bulkhead::<Sleeper>::new(config(1, 1, 50));
        tokio::spawn(bulkhead.run(gauge));

        let err = client.call(500).await.unwrap_err();
        assert_eq!(err, DependencyError::Timeout("sleeper".to_string()));
    }
}
