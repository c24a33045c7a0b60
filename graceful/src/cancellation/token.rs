//! Cancellation token for cooperative shutdown.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// A callback type for cancellation notifications.
///
/// The argument is the cancellation reason.
pub type CancelCallback = Box<dyn Fn(&str) + Send + Sync>;

struct Inner {
    /// One-way cancellation flag; doubles as the async observation point.
    state: watch::Sender<bool>,
    /// The reason for cancellation (first one wins).
    reason: RwLock<Option<String>>,
    /// Callbacks to invoke on cancellation.
    callbacks: RwLock<Vec<CancelCallback>>,
}

/// A shared token for cooperative cancellation.
///
/// Cancellation is monotonic and idempotent - once cancelled, a token stays
/// cancelled, and only the first cancellation reason is kept. Clones share
/// state, so any clone can cancel and every clone observes it.
#[derive(Clone)]
pub struct ShutdownToken {
    inner: Arc<Inner>,
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: watch::Sender::new(false),
                reason: RwLock::new(None),
                callbacks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Requests cancellation with a reason.
    ///
    /// This is idempotent - only the first reason is kept, and each
    /// registered callback runs exactly once. Panics in callbacks are logged
    /// and suppressed. Callbacks run outside the internal lock, so they may
    /// register further callbacks or cancel other tokens freely.
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let callbacks = {
            let mut callbacks = self.inner.callbacks.write();
            // Every flip happens under the callbacks lock, so this check
            // cannot race another cancel or an on_cancel registration.
            if self.is_cancelled() {
                return;
            }
            *self.inner.reason.write() = Some(reason.clone());
            // Flip last: a waiter woken by the watch must find the reason
            // already recorded.
            self.inner.state.send_modify(|cancelled| *cancelled = true);
            std::mem::take(&mut *callbacks)
        };

        for callback in &callbacks {
            invoke_callback(callback.as_ref(), &reason);
        }
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately with the
    /// recorded reason. Registration and cancellation serialize on the same
    /// lock, so a callback is either stored for `cancel` to drain or invoked
    /// here - never dropped between the two.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        {
            let mut callbacks = self.inner.callbacks.write();
            if !self.is_cancelled() {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        let reason = self.reason().unwrap_or_default();
        invoke_callback(&callback, &reason);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.state.borrow()
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.inner.reason.read().clone()
    }

    /// Resolves once the token is cancelled.
    ///
    /// Resolves immediately if cancellation has already happened. This is the
    /// observation point registered units should select on.
    pub async fn cancelled(&self) {
        let mut state = self.inner.state.subscribe();
        // wait_for inspects the current value first, so an already-cancelled
        // token resolves without yielding. The send side lives in self.inner
        // and cannot be dropped while we borrow it.
        let _ = state.wait_for(|cancelled| *cancelled).await;
    }

    /// Derives a child token that is cancelled whenever this token is.
    ///
    /// If this token is already cancelled, the child starts out cancelled.
    /// The child can also be cancelled independently; a later parent
    /// cancellation is then a no-op on it.
    #[must_use]
    pub fn child(&self) -> Self {
        let child = Self::new();
        let downstream = child.clone();
        self.on_cancel(move |reason| downstream.cancel(reason));
        child
    }
}

fn invoke_callback(callback: &dyn Fn(&str), reason: &str) {
    if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        callback(reason);
    })) {
        warn!("Cancellation callback panicked: {panic:?}");
    }
}

impl std::fmt::Debug for ShutdownToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
