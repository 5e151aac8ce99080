//! # Circuit Breaker
//!
//! A consecutive-failure breaker shared by every caller of one isolation boundary.
//!
//! ```text
//!            failures >= threshold              cooldown elapsed
//!   Closed ─────────────────────────▶ Open ─────────────────────▶ HalfOpen
//!     ▲                                ▲                             │
//!     │          probe succeeded       │       probe failed          │
//!     └────────────────────────────────┼─────────────────────────────┤
//!                                      └─────────────────────────────┘
//! ```
//!
//! While open, [`CircuitBreaker::try_acquire`] fails immediately, so a tripped
//! dependency costs its callers nothing. HalfOpen admits exactly one probe call.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{DependencyError, UnavailableReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open before admitting a probe.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 20,
            cooldown: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    closed_failure_count: u32,
    last_tripped_at: Option<Instant>,
    /// Set while a half-open probe is running. A probe whose caller vanished is
    /// replaced once it is older than the cooldown.
    probe_started_at: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                closed_failure_count: 0,
                last_tripped_at: None,
                probe_started_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Consecutive failures recorded while closed.
    pub fn failure_count(&self) -> u32 {
        self.lock().closed_failure_count
    }

    /// Ask permission to perform one call.
    ///
    /// Returns `Unavailable(CircuitOpen)` while open, and while a half-open probe is
    /// already running.
    pub fn try_acquire(&self) -> Result<(), DependencyError> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let cooled = inner
                    .last_tripped_at
                    .map_or(true, |at| at.elapsed() >= self.config.cooldown);
                if cooled {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_started_at = Some(Instant::now());
                    info!(dependency = %self.name, "Circuit half-open, admitting probe");
                    Ok(())
                } else {
                    Err(self.open_error())
                }
            }
            CircuitState::HalfOpen => {
                let busy = inner
                    .probe_started_at
                    .is_some_and(|at| at.elapsed() < self.config.cooldown);
                if busy {
                    Err(self.open_error())
                } else {
                    inner.probe_started_at = Some(Instant::now());
                    Ok(())
                }
            }
        }
    }

    pub fn on_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => inner.closed_failure_count = 0,
            CircuitState::HalfOpen => {
                info!(dependency = %self.name, "Circuit closed");
                inner.state = CircuitState::Closed;
                inner.closed_failure_count = 0;
                inner.probe_started_at = None;
            }
            // a call admitted before the trip finished late; only a probe may close
            CircuitState::Open => {}
        }
    }

    pub fn on_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.closed_failure_count += 1;
                debug!(
                    dependency = %self.name,
                    failures = inner.closed_failure_count,
                    "Failure recorded"
                );
                if inner.closed_failure_count >= self.config.failure_threshold {
                    self.trip(&mut inner);
                }
            }
            CircuitState::HalfOpen => self.trip(&mut inner),
            // a call admitted before the trip finished late; the cooldown already runs
            CircuitState::Open => {}
        }
    }

    fn trip(&self, inner: &mut BreakerState) {
        warn!(
            dependency = %self.name,
            failures = inner.closed_failure_count,
            cooldown_ms = self.config.cooldown.as_millis() as u64,
            "Circuit opened"
        );
        inner.state = CircuitState::Open;
        inner.closed_failure_count = 0;
        inner.last_tripped_at = Some(Instant::now());
        inner.probe_started_at = None;
    }

    fn open_error(&self) -> DependencyError {
        DependencyError::unavailable(&self.name, UnavailableReason::CircuitOpen)
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, cooldown_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "pricing",
            BreakerConfig {
                failure_threshold: threshold,
                cooldown: Duration::from_millis(cooldown_ms),
            },
        )
    }

    #[test]
    fn trips_after_threshold_consecutive_failures() {
        let breaker = breaker(3, 10_000);
        for _ in 0..2 {
            assert!(breaker.try_acquire().is_ok());
            breaker.on_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 2);

        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        let err = breaker.try_acquire().unwrap_err();
        assert!(err.is_circuit_open());
        assert_eq!(err.dependency(), "pricing");
    }

    #[test]
    fn success_resets_the_failure_count() {
        let breaker = breaker(2, 10_000);
        breaker.on_failure();
        breaker.on_success();
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 1);
    }

    #[test]
    fn half_open_admits_a_single_probe() {
        let breaker = breaker(1, 20);
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(30));
        assert!(breaker.try_acquire().is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.try_acquire().unwrap_err().is_circuit_open());

        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire().is_ok());
    }

    #[test]
    fn failed_probe_reopens_the_circuit() {
        let breaker = breaker(1, 20);
        breaker.on_failure();
        std::thread::sleep(Duration::from_millis(30));
        assert!(breaker.try_acquire().is_ok());

        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().unwrap_err().is_circuit_open());
    }

    #[test]
    fn abandoned_probe_is_replaced_after_cooldown() {
        let breaker = breaker(1, 20);
        breaker.on_failure();
        std::thread::sleep(Duration::from_millis(30));
        assert!(breaker.try_acquire().is_ok());

        // the probe never reports back
        std::thread::sleep(Duration::from_millis(30));
        assert!(breaker.try_acquire().is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn late_success_does_not_close_an_open_circuit() {
        let breaker = breaker(2, 10_000);
        // admitted while closed, still running when the breaker trips
        assert!(breaker.try_acquire().is_ok());
        breaker.on_failure();
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().unwrap_err().is_circuit_open());
    }
}
