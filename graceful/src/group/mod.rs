//! The close group: registration, error bridging, and the bounded wait.
//!
//! A coordination session starts with [`prepare`], which wires a derived
//! [`ShutdownToken`] to the parent token, to OS termination requests, and to
//! the error channel, and hands back the [`CloseGroup`] units register
//! against. The session ends when [`CloseGroup::wait`] resolves and
//! finalizes the error channel.

mod bridge;
mod counter;

use crate::cancellation::ShutdownToken;
use crate::errors::TaskError;
use crate::report::{ErrorSink, LoggingErrorSink};
use crate::signal::spawn_termination_listener;
use counter::UnitCounter;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Tracks registered units and owns the error channel for one coordination
/// session.
///
/// Units are fire-and-forget: the group keeps no handles, only the
/// outstanding count and, transiently, their terminal errors. Any reported
/// error cancels the session's [`ShutdownToken`]; cooperating units are
/// expected to select on that token and exit.
pub struct CloseGroup {
    /// Outstanding unit count.
    counter: UnitCounter,
    /// Send side of the error channel; taken exactly once by `wait`.
    errors: Mutex<Option<mpsc::UnboundedSender<TaskError>>>,
    /// Tells the bridge routine to drain and stop.
    finalized: ShutdownToken,
    /// The session's derived cancellation signal.
    shutdown: ShutdownToken,
}

/// Sets up a coordination session with the default logging sink.
///
/// Returns the derived shutdown token and the group to register units
/// against. The token resolves when the parent resolves, when a SIGINT or
/// SIGTERM arrives, or when any registered unit reports an error.
///
/// Must be called from within a tokio runtime: it spawns the termination
/// listener and the error bridge routine, both of which live for the
/// session.
#[must_use]
pub fn prepare(parent: &ShutdownToken) -> (ShutdownToken, CloseGroup) {
    prepare_with_sink(parent, Arc::new(LoggingErrorSink))
}

/// Sets up a coordination session with a caller-supplied error sink.
///
/// See [`prepare`] for the wiring; the sink replaces the default logging
/// hook and receives each reported error exactly once, in receipt order.
#[must_use]
pub fn prepare_with_sink(
    parent: &ShutdownToken,
    sink: Arc<dyn ErrorSink>,
) -> (ShutdownToken, CloseGroup) {
    let shutdown = parent.child();
    spawn_termination_listener(shutdown.clone());

    let (errors_tx, errors_rx) = mpsc::unbounded_channel();
    let finalized = ShutdownToken::new();
    tokio::spawn(bridge::run(
        errors_rx,
        shutdown.clone(),
        finalized.clone(),
        sink,
    ));

    let group = CloseGroup {
        counter: UnitCounter::new(),
        errors: Mutex::new(Some(errors_tx)),
        finalized,
        shutdown: shutdown.clone(),
    };
    (shutdown, group)
}

impl CloseGroup {
    /// Registers a long-running process.
    ///
    /// Returns immediately after incrementing the outstanding count and
    /// spawning `run(target)` on its own task. Registration never checks the
    /// cancellation state; a unit registered into an already-cancelled
    /// session still runs and is expected to observe the token promptly. On
    /// completion the unit's error, if any, is routed to the bridge, and the
    /// outstanding count drops regardless of outcome.
    pub fn spawn_process<T, F, Fut>(&self, target: T, run: F)
    where
        T: Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.spawn_unit(target, run);
    }

    /// Registers a cleanup action.
    ///
    /// Identical mechanics to [`spawn_process`](Self::spawn_process); the
    /// distinction is purely documentational for the caller.
    pub fn spawn_closer<T, F, Fut>(&self, target: T, run: F)
    where
        T: Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.spawn_unit(target, run);
    }

    fn spawn_unit<T, F, Fut>(&self, target: T, run: F)
    where
        T: Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let Some(errors) = self.errors.lock().clone() else {
            warn!("unit registered after wait resolved; not spawned");
            return;
        };
        let guard = self.counter.add();

        tokio::spawn(async move {
            // Guard drops on every exit path, panic included.
            let _guard = guard;
            if let Err(err) = run(target).await {
                // The channel is unbounded, so reporting never blocks. A
                // failed send means the session was finalized while this
                // unit was still running.
                if errors.send(err).is_err() {
                    debug!("task error reported after finalization; dropped");
                }
            }
        });
    }

    /// Waits for all registered units to finish, up to `timeout`.
    ///
    /// Races the outstanding count reaching zero against the timer, logs
    /// which branch won, then finalizes the error channel. Finalization
    /// happens exactly once; a second call logs a warning and returns
    /// immediately.
    ///
    /// The timeout bounds only this call. Units still running afterwards are
    /// detached: they keep running, their completions are recorded safely,
    /// and any late errors are dropped with a debug log.
    pub async fn wait(&self, timeout: Duration) {
        if self.errors.lock().is_none() {
            warn!("wait called more than once on a close group");
            return;
        }

        tokio::select! {
            () = self.counter.wait_idle() => {
                info!("All processes closed gracefully.");
            }
            () = tokio::time::sleep(timeout) => {
                warn!("Timeout reached, some processes may not be closed.");
            }
        }

        // Single finalization point: drop the send side and stop the bridge.
        let sender = self.errors.lock().take();
        if sender.is_none() {
            warn!("concurrent wait lost the finalization race");
            return;
        }
        drop(sender);
        self.finalized.cancel("close group finalized");
    }

    /// Returns the number of units that have not yet completed.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.counter.outstanding()
    }
}

impl std::fmt::Debug for CloseGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseGroup")
            .field("outstanding", &self.outstanding())
            .field("cancelled", &self.shutdown.is_cancelled())
            .field("finalized", &self.finalized.is_cancelled())
            .finish()
    }
}
