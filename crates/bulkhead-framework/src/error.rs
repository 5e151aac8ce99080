//! # Framework Errors
//!
//! This module defines the error types shared by every isolation boundary and
//! background executor. Centralizing them keeps the failure taxonomy identical
//! for the price and products dependencies, so callers can match on one enum.

/// Why a dependency could not serve a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnavailableReason {
    /// The circuit breaker is open; the call was not attempted.
    #[error("circuit open")]
    CircuitOpen,
    /// The bulkhead queue is full.
    #[error("bulkhead queue full")]
    PoolRejected,
    /// The bulkhead has stopped and no longer accepts calls.
    #[error("bulkhead closed")]
    PoolClosed,
    /// The remote endpoint could not be reached.
    #[error("network failure: {0}")]
    Network(String),
    /// The remote endpoint answered with something we cannot use.
    #[error("bad response: {0}")]
    BadResponse(String),
}

/// Errors returned by an isolated dependency call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    /// The dependency did not answer within its time budget.
    #[error("dependency `{0}` timed out")]
    Timeout(String),
    /// The dependency is unreachable, failing, or fenced off by its breaker.
    #[error("dependency `{dependency}` unavailable: {reason}")]
    Unavailable {
        dependency: String,
        reason: UnavailableReason,
    },
}

impl DependencyError {
    pub fn unavailable(dependency: impl Into<String>, reason: UnavailableReason) -> Self {
        Self::Unavailable {
            dependency: dependency.into(),
            reason,
        }
    }

    /// Name of the isolation boundary that produced this error.
    pub fn dependency(&self) -> &str {
        match self {
            Self::Timeout(name) => name,
            Self::Unavailable { dependency, .. } => dependency,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// True when the breaker rejected the call without touching the network.
    pub fn is_circuit_open(&self) -> bool {
        matches!(
            self,
            Self::Unavailable {
                reason: UnavailableReason::CircuitOpen,
                ..
            }
        )
    }
}

/// Errors produced by the background execution path.
///
/// None of these ever reach a request caller: submit failures and task
/// failures are logged by the submitter or the worker and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("executor `{0}` is shut down")]
    ShutDown(String),
    #[error("executor `{0}` queue is full")]
    QueueFull(String),
    #[error("background task failed: {0}")]
    Failed(String),
}
