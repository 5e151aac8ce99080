//! # Bulkhead Framework
//!
//! This crate provides the building blocks for calling remote dependencies from a request
//! path without letting one slow or failing dependency take the whole process down with it.
//! Every dependency gets its own **isolation boundary**: a bounded worker pool (the
//! *bulkhead*) and a consecutive-failure *circuit breaker*. Work that must not delay the
//! caller at all goes to a [`BackgroundExecutor`] or a [`TaskGroup`].
//!
//! ## Why Bulkheads + Breakers?
//!
//! ### Bulkhead
//!
//! - A fixed number of permits per dependency caps concurrent calls
//! - A bounded queue absorbs short bursts and rejects the rest immediately
//! - Pools are never shared, so a stalled price service cannot starve product lookups
//!
//! ### Circuit Breaker
//!
//! - Counts consecutive failures (timeouts included)
//! - Once tripped, calls fail in microseconds instead of waiting for a timeout
//! - After a cooldown a single probe decides whether to close again
//!
//! **Further Reading**:
//! - [Release It! (Bulkheads and Circuit Breakers)](https://pragprog.com/titles/mnee2/release-it-second-edition/) - Michael Nygard's stability patterns
//! - [CircuitBreaker (Martin Fowler)](https://martinfowler.com/bliki/CircuitBreaker.html) - The state machine in brief
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - The channel-backed handle pattern the pools are built on
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Dependency Layer** ([`Dependency`]) - How to fetch one value from one downstream
//! 2. **Runtime Layer** ([`Bulkhead`]) - Permits, queueing, per-call timeouts
//! 3. **Interface Layer** ([`IsolatedClient`]) - Breaker checks and typed calls
//!
//! You write the remote call **once** in [`Dependency::fetch`]; the framework decides
//! whether, when and for how long it runs.
//!
//! ```rust
//! use async_trait::async_trait;
//! use bulkhead_framework::{Bulkhead, BulkheadConfig, Dependency, DependencyError};
//! use std::time::Duration;
//!
//! // 1. Describe the downstream
//! struct Inventory;
//!
//! #[async_trait]
//! impl Dependency for Inventory {
//!     type Id = u32;
//!     type Output = u32;
//!     type Context = u32; // stock level every item reports
//!
//!     async fn fetch(_id: u32, stock: &u32) -> Result<u32, DependencyError> {
//!         Ok(*stock)
//!     }
//! }
//!
//! // 2. Start its boundary
//! #[tokio::main]
//! async fn main() {
//!     let config = BulkheadConfig {
//!         max_concurrency: 4,
//!         timeout: Duration::from_millis(500),
//!         ..BulkheadConfig::named("inventory")
//!     };
//!     let (bulkhead, client) = Bulkhead::<Inventory>::new(config);
//!
//!     // Context is injected when the pool starts
//!     tokio::spawn(bulkhead.run(12));
//!
//!     assert_eq!(client.call(1).await.unwrap(), 12);
//! }
//! ```
//!
//! ## Failure Taxonomy
//!
//! Every call returns `Result<D::Output, DependencyError>`:
//!
//! - [`DependencyError::Timeout`] - the call exceeded its budget
//! - [`DependencyError::Unavailable`] - see [`UnavailableReason`]: open circuit, full or
//!   closed pool, network failure, unusable response
//!
//! All of them except an open circuit count toward tripping the breaker.
//!
//! ## Background Work
//!
//! [`BackgroundExecutor::submit`] queues a future and returns at once; [`TaskGroup::submit`]
//! starts it on its own task. Both `shutdown`s drain for a bounded time and then abort.

pub mod breaker;
pub mod bulkhead;
pub mod client;
pub mod client_trait;
pub mod dependency;
pub mod error;
pub mod executor;
pub mod message;
pub mod mock;
pub mod observe;
pub mod tracing;

// Re-exports for convenience
pub use breaker::{BreakerConfig, CircuitBreaker, CircuitState};
pub use bulkhead::{Bulkhead, BulkheadConfig};
pub use client::IsolatedClient;
pub use client_trait::IsolatedCaller;
pub use dependency::Dependency;
pub use error::{DependencyError, TaskError, UnavailableReason};
pub use executor::{BackgroundExecutor, Job, TaskGroup};
pub use message::{CallRequest, Response};
pub use observe::{LogTracer, SharedTracer, Tracer};
