//! # Notifier
//!
//! Sends the "catalog viewed" email on its own task so the request that
//! triggered it never waits for the mail server. Sends never queue behind
//! each other: each one starts as soon as it is scheduled.

use bulkhead_framework::{SharedTracer, TaskGroup};
use std::time::Duration;
use tracing::{info, warn};

/// Name of the task group that runs notification sends.
pub const NOTIFICATIONS: &str = "notifications";

pub struct Notifier {
    sends: TaskGroup,
    tracer: SharedTracer,
    send_delay: Duration,
}

impl Notifier {
    /// Must be called from within a Tokio runtime.
    pub fn new(tracer: SharedTracer, send_delay: Duration) -> Self {
        Self {
            sends: TaskGroup::new(NOTIFICATIONS),
            tracer,
            send_delay,
        }
    }

    /// Schedule a send and return immediately.
    ///
    /// Neither scheduling failures nor send failures reach the caller; both are logged.
    pub fn notify_async(&self) {
        let tracer = self.tracer.clone();
        let delay = self.send_delay;

        let submitted = self.sends.submit(async move {
            info!("sending email...");
            tokio::time::sleep(delay).await;
            tracer.tag("cluster", "phoenix");
            info!("Email sent");
            Ok(())
        });
        if let Err(e) = submitted {
            warn!(error = %e, "Notification dropped");
        }
    }

    /// Sends that completed.
    pub fn sent(&self) -> usize {
        self.sends.completed()
    }

    /// Stop accepting sends and give running ones up to `drain` to finish.
    pub async fn shutdown(&self, drain: Duration) {
        self.sends.shutdown(drain).await;
    }
}
