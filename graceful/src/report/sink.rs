//! Error sink trait and implementations.

use crate::errors::TaskError;
use tracing::error;

/// Trait for sinks that receive task errors from the bridge routine.
///
/// The bridge is a single consumer, so `report` is never called concurrently
/// with itself. Only non-nil errors reach the sink; a unit that finishes
/// cleanly reports nothing.
pub trait ErrorSink: Send + Sync {
    /// Reports a single task error.
    fn report(&self, err: &TaskError);
}

/// The default sink: logs each error through the process-wide tracing
/// subscriber with a fixed prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingErrorSink;

impl ErrorSink for LoggingErrorSink {
    fn report(&self, err: &TaskError) {
        error!("graceful error: {err:#}");
    }
}

/// A sink that discards all errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpErrorSink;

impl ErrorSink for NoOpErrorSink {
    fn report(&self, _err: &TaskError) {
        // Intentionally empty - discards all errors
    }
}

/// A collecting sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    errors: parking_lot::RwLock<Vec<String>>,
}

impl CollectingErrorSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected error messages.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.errors.read().clone()
    }

    /// Returns the number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.read().len()
    }

    /// Returns whether no errors have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.read().is_empty()
    }
}

impl ErrorSink for CollectingErrorSink {
    fn report(&self, err: &TaskError) {
        self.errors.write().push(format!("{err:#}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collecting_sink_records_in_order() {
        let sink = CollectingErrorSink::new();
        sink.report(&anyhow!("first"));
        sink.report(&anyhow!("second"));

        assert_eq!(sink.errors(), vec!["first".to_string(), "second".to_string()]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_collecting_sink_starts_empty() {
        let sink = CollectingErrorSink::new();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_noop_sink_discards() {
        let sink = NoOpErrorSink;
        sink.report(&anyhow!("ignored"));
    }

    #[test]
    fn test_logging_sink_does_not_panic() {
        let sink = LoggingErrorSink;
        sink.report(&anyhow!("logged"));
    }
}
