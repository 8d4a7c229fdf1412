//! Notification channel for operator-facing messages.
//!
//! Components receive a [`LaunchLogger`] when they are constructed instead of
//! reaching for a global, so tests can swap in a recording implementation.

use std::sync::Arc;

pub trait LaunchLogger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards every message to `tracing` under the `container_exec` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl LaunchLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "container_exec", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "container_exec", "{}", message);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl LaunchLogger for NullLogger {
    fn info(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}
}

pub type SharedLogger = Arc<dyn LaunchLogger>;

pub fn tracing_logger() -> SharedLogger {
    Arc::new(TracingLogger)
}
