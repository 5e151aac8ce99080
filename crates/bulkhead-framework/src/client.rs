//! # Isolated Client
//!
//! This module defines the client half of an isolation boundary.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::breaker::{CircuitBreaker, CircuitState};
use crate::dependency::Dependency;
use crate::error::{DependencyError, UnavailableReason};
use crate::message::CallRequest;

/// ## IsolatedClient
///
/// The `IsolatedClient<D>` fronts a `Bulkhead<D>`. A call first asks the shared circuit
/// breaker for permission, then enqueues the request without waiting for queue space,
/// and finally waits for the answer within the boundary's timeout. The outcome is fed
/// back into the breaker.
///
/// * **Cloneable** – holds a sender and two `Arc`s, so cloning is inexpensive.
/// * **Fail fast** – an open circuit or a full queue returns before any I/O happens.
/// * **Bounded** – no call outlives the configured timeout.
pub struct IsolatedClient<D: Dependency> {
    name: Arc<str>,
    sender: mpsc::Sender<CallRequest<D>>,
    breaker: Arc<CircuitBreaker>,
    timeout: Duration,
}

impl<D: Dependency> Clone for IsolatedClient<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            sender: self.sender.clone(),
            breaker: self.breaker.clone(),
            timeout: self.timeout,
        }
    }
}

impl<D: Dependency> IsolatedClient<D> {
    pub fn new(
        name: Arc<str>,
        sender: mpsc::Sender<CallRequest<D>>,
        breaker: Arc<CircuitBreaker>,
        timeout: Duration,
    ) -> Self {
        Self {
            name,
            sender,
            breaker,
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub async fn call(&self, id: D::Id) -> Result<D::Output, DependencyError> {
        if let Err(e) = self.breaker.try_acquire() {
            debug!(dependency = %self.name, %id, "Short-circuited");
            return Err(e);
        }

        let result = self.dispatch(id).await;
        match &result {
            Ok(_) => self.breaker.on_success(),
            Err(_) => self.breaker.on_failure(),
        }
        result
    }

    async fn dispatch(&self, id: D::Id) -> Result<D::Output, DependencyError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .try_send(CallRequest { id, respond_to })
            .map_err(|e| {
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => UnavailableReason::PoolRejected,
                    mpsc::error::TrySendError::Closed(_) => UnavailableReason::PoolClosed,
                };
                DependencyError::unavailable(self.name.as_ref(), reason)
            })?;

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(DependencyError::unavailable(
                self.name.as_ref(),
                UnavailableReason::PoolClosed,
            )),
            Err(_) => Err(DependencyError::Timeout(self.name.to_string())),
        }
    }
}
