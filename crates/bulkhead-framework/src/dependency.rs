//! # Dependency Trait
//!
//! The `Dependency` trait describes one downstream service that should live behind its
//! own isolation boundary. It names the identifier a call is keyed by, the value the
//! downstream returns, and the runtime context (HTTP client, base address, ...) the
//! fetch needs.
//!
//! # Architecture Note
//! The trait carries no state. A [`Bulkhead`](crate::Bulkhead) owns the context and
//! calls [`Dependency::fetch`] from its worker tasks, so the same fetch logic is reused
//! for every concurrent call the pool admits.
//!
//! The context is injected when the pool starts (`bulkhead.run(context)`), not when it
//! is constructed. Tests can build the client half first and wire a mock context later.

use async_trait::async_trait;
use std::fmt::{Debug, Display};

use crate::error::DependencyError;

#[async_trait]
pub trait Dependency: Send + Sync + 'static {
    /// Key the downstream is looked up by. Rendered into request paths via `Display`.
    type Id: Clone + PartialEq + Send + Sync + Display + Debug + 'static;

    /// Value the downstream produces for one call.
    type Output: Send + Debug + 'static;

    /// Runtime dependencies shared by every call on this boundary.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync + 'static;

    /// Perform one remote call.
    ///
    /// Implementations should map transport failures onto
    /// [`DependencyError::Timeout`] or [`DependencyError::Unavailable`] so they count
    /// toward the breaker's failure budget.
    async fn fetch(id: Self::Id, ctx: &Self::Context) -> Result<Self::Output, DependencyError>;
}
