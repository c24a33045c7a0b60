//! Cooperative cancellation primitives.
//!
//! This module provides [`ShutdownToken`], the shared cancellation signal
//! that combines parent cancellation, OS termination requests, and
//! task-failure-triggered cancellation into a single observable.

mod token;

pub use token::{CancelCallback, ShutdownToken};
