//! # Mock Framework & Testing Guide
//!
//! The `MockClient<D>` type hands out a real [`IsolatedClient<D>`](crate::IsolatedClient),
//! breaker included, whose calls are answered from a queue of expectations instead of a
//! `Bulkhead`. Code under test cannot tell the difference, and no network is involved.
//!
//! ## When to use Mocks vs Real Bulkheads
//!
//! | Feature | MockClient | Real Bulkhead |
//! |---------|------------|---------------|
//! | **Speed** | Instant (in-memory) | Depends on the dependency |
//! | **Determinism** | 100% Deterministic | Subject to the network |
//! | **Breaker** | Real | Real |
//! | **Use Case** | Testing logic *around* the client | Testing pools and transports |
//! | **Error Injection** | Easy (`return_err`) | Needs a failing server |
//!
//! ## Testing Failure Scenarios
//!
//! ```rust
//! use async_trait::async_trait;
//! use bulkhead_framework::mock::MockClient;
//! use bulkhead_framework::{BreakerConfig, BulkheadConfig, Dependency, DependencyError, UnavailableReason};
//! use std::time::Duration;
//!
//! struct Price;
//!
//! #[async_trait]
//! impl Dependency for Price {
//!     type Id = u32;
//!     type Output = String;
//!     type Context = ();
//!     async fn fetch(_: u32, _: &()) -> Result<String, DependencyError> { unreachable!() }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = BulkheadConfig {
//!         breaker: BreakerConfig { failure_threshold: 1, cooldown: Duration::from_secs(60) },
//!         ..BulkheadConfig::named("pricing")
//!     };
//!     let mut mock = MockClient::<Price>::with_config(config);
//!     let client = mock.client();
//!
//!     // Simulate a downstream outage
//!     mock.expect_call(1)
//!         .return_err(DependencyError::unavailable("pricing", UnavailableReason::Network("refused".into())));
//!
//!     assert!(client.call(1).await.is_err());
//!
//!     // The breaker is now open: the second call never reaches the mock
//!     assert!(client.call(1).await.unwrap_err().is_circuit_open());
//!     assert_eq!(mock.calls(), 1);
//!     mock.verify();
//! }
//! ```
//!
//! ## Mocking Utilities
//!
//! Use [`create_mock_client`] to get a client and a receiver, or use the fluent [`MockClient`] API.
//! [`RecordingTracer`] captures what a service reported through the [`Tracer`] port.

use crate::breaker::CircuitBreaker;
use crate::bulkhead::BulkheadConfig;
use crate::client::IsolatedClient;
use crate::dependency::Dependency;
use crate::error::DependencyError;
use crate::message::CallRequest;
use crate::observe::Tracer;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected call and the answer to give it.
struct Expectation<D: Dependency> {
    id: D::Id,
    response: Result<D::Output, DependencyError>,
}

/// A mock client with expectation tracking for fluent testing.
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<PriceLookup>::new();
/// mock.expect_call(CatalogId(1)).return_ok(dec!(100));
///
/// let client = PriceClient::new(mock.client());
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockClient<D: Dependency> {
    client: IsolatedClient<D>,
    expectations: Arc<Mutex<VecDeque<Expectation<D>>>>,
    calls: Arc<AtomicUsize>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<D: Dependency> Default for MockClient<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dependency> MockClient<D> {
    /// Creates a new mock client with no expectations and default boundary settings.
    pub fn new() -> Self {
        Self::with_config(BulkheadConfig::named(std::any::type_name::<D>()))
    }

    /// Creates a mock whose client uses `config` for its name, timeout and breaker.
    pub fn with_config(config: BulkheadConfig) -> Self {
        let (sender, mut receiver) = mpsc::channel::<CallRequest<D>>(100);
        let expectations = Arc::new(Mutex::new(VecDeque::<Expectation<D>>::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let expectations_clone = expectations.clone();
        let calls_clone = calls.clone();

        // Spawn background task to answer calls
        let handle = tokio::spawn(async move {
            while let Some(CallRequest { id, respond_to }) = receiver.recv().await {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                let expectation = expectations_clone.lock().unwrap().pop_front();

                match expectation {
                    Some(expectation) => {
                        assert_eq!(expectation.id, id, "Unexpected call id");
                        let _ = respond_to.send(expectation.response);
                    }
                    None => panic!("Unexpected call with id {id}"),
                }
            }
        });

        let breaker = Arc::new(CircuitBreaker::new(config.name.clone(), config.breaker.clone()));
        let client = IsolatedClient::new(Arc::from(config.name.as_str()), sender, breaker, config.timeout);

        Self {
            client,
            expectations,
            calls,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> IsolatedClient<D> {
        self.client.clone()
    }

    /// Expects a call for `id`.
    pub fn expect_call(&mut self, id: D::Id) -> CallExpectationBuilder<D> {
        CallExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Number of calls that reached the mock (short-circuited calls never do).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

/// Builder for call expectations.
pub struct CallExpectationBuilder<D: Dependency> {
    id: D::Id,
    expectations: Arc<Mutex<VecDeque<Expectation<D>>>>,
}

impl<D: Dependency> CallExpectationBuilder<D> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: D::Output) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            id: self.id,
            response: Ok(value),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: DependencyError) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            id: self.id,
            response: Err(error),
        });
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates a client and the receiver its calls arrive on.
///
/// Useful when a test needs to control *when* a call is answered, e.g. to hold a
/// call open while asserting something else.
///
/// **Note**: Consider using [`MockClient`] for a more fluent API.
pub fn create_mock_client<D: Dependency>(
    config: BulkheadConfig,
) -> (IsolatedClient<D>, mpsc::Receiver<CallRequest<D>>) {
    let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
    let breaker = Arc::new(CircuitBreaker::new(config.name.clone(), config.breaker.clone()));
    let client = IsolatedClient::new(Arc::from(config.name.as_str()), sender, breaker, config.timeout);
    (client, receiver)
}

/// Helper to take the next call from a mock receiver.
pub async fn expect_call<D: Dependency>(
    receiver: &mut mpsc::Receiver<CallRequest<D>>,
) -> Option<(D::Id, oneshot::Sender<Result<D::Output, DependencyError>>)> {
    receiver
        .recv()
        .await
        .map(|CallRequest { id, respond_to }| (id, respond_to))
}

// =============================================================================
// RECORDING TRACER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Event(String),
    Tag(String, String),
}

/// A [`Tracer`] that keeps everything it is told, in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    records: Mutex<Vec<Recorded>>,
}

impl RecordingTracer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<Recorded> {
        self.records.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Event(name) => Some(name),
                Recorded::Tag(..) => None,
            })
            .collect()
    }

    /// The last value recorded for tag `key`.
    pub fn tag_value(&self, key: &str) -> Option<String> {
        self.records().into_iter().rev().find_map(|r| match r {
            Recorded::Tag(k, v) if k == key => Some(v),
            _ => None,
        })
    }
}

impl Tracer for RecordingTracer {
    fn event(&self, name: &str) {
        self.records
            .lock()
            .unwrap()
            .push(Recorded::Event(name.to_string()));
    }

    fn tag(&self, key: &str, value: &str) {
        self.records
            .lock()
            .unwrap()
            .push(Recorded::Tag(key.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::{BreakerConfig, CircuitState};
    use crate::error::UnavailableReason;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Lookup;

    #[async_trait]
    impl Dependency for Lookup {
        type Id = u32;
        type Output = String;
        type Context = ();

        async fn fetch(_id: u32, _ctx: &()) -> Result<String, DependencyError> {
            unreachable!("mocks never fetch")
        }
    }

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<Lookup>(BulkheadConfig::named("lookup"));

        let call_task = tokio::spawn(async move { client.call(7).await });

        let (id, responder) = expect_call(&mut receiver)
            .await
            .expect("Expected a call");
        assert_eq!(id, 7);
        responder.send(Ok("seven".to_string())).unwrap();

        let result = call_task.await.unwrap();
        assert_eq!(result.unwrap(), "seven");
    }

    #[tokio::test]
    async fn test_mock_client_with_expectations() {
        let mut mock = MockClient::<Lookup>::new();
        mock.expect_call(1).return_ok("one".to_string());
        mock.expect_call(2).return_ok("two".to_string());

        let client = mock.client();
        assert_eq!(client.call(1).await.unwrap(), "one");
        assert_eq!(client.call(2).await.unwrap(), "two");

        assert_eq!(mock.calls(), 2);
        mock.verify();
    }

    #[tokio::test]
    async fn test_open_circuit_skips_the_mock() {
        let config = BulkheadConfig {
            breaker: BreakerConfig {
                failure_threshold: 2,
                cooldown: Duration::from_secs(60),
            },
            ..BulkheadConfig::named("lookup")
        };
        let mut mock = MockClient::<Lookup>::with_config(config);
        let refused = DependencyError::unavailable("lookup", UnavailableReason::Network("refused".into()));
        mock.expect_call(1).return_err(refused.clone());
        mock.expect_call(1).return_err(refused);

        let client = mock.client();
        assert!(client.call(1).await.is_err());
        assert!(client.call(1).await.is_err());
        assert_eq!(client.circuit_state(), CircuitState::Open);

        let err = client.call(1).await.unwrap_err();
        assert!(err.is_circuit_open());
        assert_eq!(mock.calls(), 2);
        mock.verify();
    }

    #[test]
    fn test_recording_tracer_keeps_order() {
        let tracer = RecordingTracer::new();
        tracer.event("cache.miss");
        tracer.tag("cluster", "cluster1");
        tracer.event("gc.full");

        assert_eq!(tracer.events(), vec!["cache.miss", "gc.full"]);
        assert_eq!(tracer.tag_value("cluster").as_deref(), Some("cluster1"));
    }
}
