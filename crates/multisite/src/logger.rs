//! Progress reporting for workflows.

use std::fmt;

/// Sink for the human-readable progress lines a workflow emits before each
/// step.
pub trait Logger: Send + Sync {
    fn log(&self, line: fmt::Arguments<'_>);
}

/// [`Logger`] forwarding every line to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, line: fmt::Arguments<'_>) {
        tracing::info!("{line}");
    }
}
