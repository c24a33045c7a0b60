//! Pluggable error reporting.
//!
//! The coordinator never surfaces task errors to the caller; they flow
//! through an [`ErrorSink`] injected at setup. The default sink logs each
//! error, [`CollectingErrorSink`] records them for tests, and
//! [`NoOpErrorSink`] drops them.

mod sink;

pub use sink::{CollectingErrorSink, ErrorSink, LoggingErrorSink, NoOpErrorSink};
