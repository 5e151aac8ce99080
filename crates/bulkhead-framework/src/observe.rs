//! # Observability Port
//!
//! Business code reports named events (`cache.miss`, `gc.full`, ...) and tags
//! (`cluster`, ...) through the [`Tracer`] trait and never learns where they go.
//! [`LogTracer`] forwards them to the `tracing` subscriber; tests use
//! [`RecordingTracer`](crate::mock::RecordingTracer).
//!
//! Reporting must never influence control flow, so both methods are infallible.

use std::sync::Arc;
use tracing::info;

pub trait Tracer: Send + Sync + 'static {
    /// Record that something happened within the current request.
    fn event(&self, name: &str);

    /// Attach a key/value label to the current trace context.
    fn tag(&self, key: &str, value: &str);
}

/// Shared handle passed into services.
pub type SharedTracer = Arc<dyn Tracer>;

/// Emits events and tags as structured `tracing` records inside the current span.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn event(&self, name: &str) {
        info!(event = name, "trace event");
    }

    fn tag(&self, key: &str, value: &str) {
        info!(tag = key, value, "trace tag");
    }
}
