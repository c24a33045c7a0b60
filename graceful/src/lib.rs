//! # Graceful
//!
//! Shutdown coordination for long-running tokio processes.
//!
//! Graceful gives servers, workers, and background jobs one shared point of
//! lifecycle coordination:
//!
//! - **Derived cancellation**: one [`ShutdownToken`] combining parent
//!   cancellation, OS termination requests (SIGINT/SIGTERM), and task
//!   failures
//! - **Registration**: fire-and-forget processes and closers tracked by an
//!   outstanding-unit counter
//! - **Error bridging**: any unit's error is reported through a pluggable
//!   sink and triggers global cancellation
//! - **Bounded join**: a timeout-guarded wait that collects all units before
//!   the process exits
//!
//! Cancellation is cooperative: the coordinator only flips the token, and
//! each unit is responsible for selecting on it and exiting.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graceful::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (shutdown, group) = prepare(&ShutdownToken::new());
//!
//!     group.spawn_process(server, |server| async move {
//!         server.run_until(shutdown).await
//!     });
//!     group.spawn_closer(pool, |pool| async move {
//!         pool.close().await
//!     });
//!
//!     shutdown.cancelled().await;
//!     group.wait(Duration::from_secs(10)).await;
//! }
//! ```
//!
//! [`ShutdownToken`]: cancellation::ShutdownToken

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod errors;
pub mod group;
pub mod report;
pub mod signal;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::ShutdownToken;
    pub use crate::errors::{GracefulError, TaskError};
    pub use crate::group::{prepare, prepare_with_sink, CloseGroup};
    pub use crate::report::{
        CollectingErrorSink, ErrorSink, LoggingErrorSink, NoOpErrorSink,
    };
    pub use crate::signal::wait_for_termination;
}
