//! # Call Messages
//!
//! This module defines the message passed from an `IsolatedClient` to its `Bulkhead`.

use crate::dependency::Dependency;
use crate::error::DependencyError;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by bulkhead workers.
pub type Response<T> = oneshot::Sender<Result<T, DependencyError>>;

/// One queued call waiting for a worker permit.
#[derive(Debug)]
pub struct CallRequest<D: Dependency> {
    pub id: D::Id,
    pub respond_to: Response<D::Output>,
}
