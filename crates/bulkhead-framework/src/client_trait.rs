//! # IsolatedCaller Trait
//!
//! Provides a common interface for dependency-specific clients, adding a default `call`
//! built on top of a generic `IsolatedClient`.
use crate::{Dependency, DependencyError, IsolatedClient};
use async_trait::async_trait;

/// Trait for dependency-specific clients to inherit the isolated call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use bulkhead_framework::{Bulkhead, BulkheadConfig, Dependency, DependencyError, IsolatedCaller, IsolatedClient};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Dependency for Echo {
///     type Id = u32;
///     type Output = String;
///     type Context = ();
///
///     async fn fetch(id: u32, _: &()) -> Result<String, DependencyError> {
///         Ok(id.to_string())
///     }
/// }
///
/// struct EchoClient {
///     inner: IsolatedClient<Echo>,
/// }
///
/// impl IsolatedCaller<Echo> for EchoClient {
///     fn inner(&self) -> &IsolatedClient<Echo> {
///         &self.inner
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (bulkhead, inner) = Bulkhead::<Echo>::new(BulkheadConfig::named("echo"));
///     tokio::spawn(bulkhead.run(()));
///
///     // call() is provided automatically
///     let client = EchoClient { inner };
///     assert_eq!(client.call(7).await.unwrap(), "7");
/// }
/// ```
#[async_trait]
pub trait IsolatedCaller<D: Dependency>: Send + Sync {
    /// Access the inner generic IsolatedClient.
    fn inner(&self) -> &IsolatedClient<D>;

    /// Call the dependency through its bulkhead and breaker.
    #[tracing::instrument(skip(self))]
    async fn call(&self, id: D::Id) -> Result<D::Output, DependencyError> {
        tracing::debug!("Sending request");
        self.inner().call(id).await
    }
}
