//! OS termination request handling.
//!
//! On Unix the coordinator reacts to SIGINT (Ctrl-C in a terminal) and
//! SIGTERM (the default kill signal, used by systemd and Kubernetes). On
//! other platforms only [`tokio::signal::ctrl_c`] is available.
//!
//! Delivery semantics belong to the OS and tokio; this module only
//! subscribes, forwards the first request to a [`ShutdownToken`], and drops
//! the subscription once that token resolves.

use crate::cancellation::ShutdownToken;
use crate::errors::GracefulError;
use tracing::error;

/// Resolves when the process receives a termination request.
///
/// # Errors
///
/// Returns [`GracefulError::Signal`] if a signal handler cannot be
/// registered.
#[cfg(unix)]
pub async fn wait_for_termination() -> Result<(), GracefulError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

/// Resolves when the process receives a termination request.
///
/// # Errors
///
/// Returns [`GracefulError::Signal`] if the Ctrl-C handler cannot be
/// registered.
#[cfg(not(unix))]
pub async fn wait_for_termination() -> Result<(), GracefulError> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

/// Spawns the listener bridging OS termination requests into `token`.
///
/// The listener holds the signal subscription and races it against the
/// token itself: if the token is cancelled first (by the parent or by a task
/// failure), the listener returns and the subscription is released. Either
/// way the subscription is relinquished exactly once.
pub(crate) fn spawn_termination_listener(token: ShutdownToken) {
    tokio::spawn(async move {
        tokio::select! {
            registered = wait_for_termination() => match registered {
                Ok(()) => token.cancel("termination signal received"),
                Err(err) => error!("graceful error: {err}"),
            },
            () = token.cancelled() => {}
        }
    });
}
