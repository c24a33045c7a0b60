//! Error types for the graceful shutdown coordinator.
//!
//! The coordination layer knows exactly one kind of failure from the outside
//! world: a registered unit returning an error. Those are opaque to the
//! coordinator and carried as [`TaskError`]. [`GracefulError`] covers the
//! crate's own fallible operations.

use thiserror::Error;

/// The error reported by a registered unit's run function.
///
/// The coordinator never inspects these beyond formatting them for the
/// reporting sink, so an opaque boxed error is all that is needed.
pub type TaskError = anyhow::Error;

/// Errors produced by the graceful crate itself.
#[derive(Debug, Error)]
pub enum GracefulError {
    /// Registering an OS signal handler failed.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}
