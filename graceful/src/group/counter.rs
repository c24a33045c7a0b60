//! Completion counter for registered units.

use tokio::sync::watch;
use tracing::warn;

/// Counts outstanding units and lets a single waiter await zero.
///
/// Increments happen at registration, decrements when a [`UnitGuard`] drops.
/// Updates go through the watch channel's send side, so they are
/// linearizable: a waiter observes zero only after every decrement is
/// visible. The count never goes negative.
#[derive(Debug, Clone)]
pub(crate) struct UnitCounter {
    count: watch::Sender<usize>,
}

impl UnitCounter {
    pub(crate) fn new() -> Self {
        Self {
            count: watch::Sender::new(0),
        }
    }

    /// Registers one unit, returning the guard that will mark it complete.
    pub(crate) fn add(&self) -> UnitGuard {
        self.count.send_modify(|count| *count += 1);
        UnitGuard {
            count: self.count.clone(),
        }
    }

    /// Returns the number of outstanding units.
    pub(crate) fn outstanding(&self) -> usize {
        *self.count.borrow()
    }

    /// Resolves once the outstanding count reaches zero.
    ///
    /// Resolves immediately if nothing is registered.
    pub(crate) async fn wait_idle(&self) {
        let mut count = self.count.subscribe();
        // The send side lives in self, so wait_for cannot fail here.
        let _ = count.wait_for(|count| *count == 0).await;
    }
}

/// Marks one unit complete when dropped.
///
/// Dropping on panic unwind still decrements, so a crashing unit cannot
/// strand the waiter.
#[derive(Debug)]
pub(crate) struct UnitGuard {
    count: watch::Sender<usize>,
}

impl Drop for UnitGuard {
    fn drop(&mut self) {
        self.count.send_modify(|count| {
            if let Some(decremented) = count.checked_sub(1) {
                *count = decremented;
            } else {
                warn!("unit counter underflow; completion recorded twice");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_counter_starts_idle() {
        let counter = UnitCounter::new();
        assert_eq!(counter.outstanding(), 0);
    }

    #[test]
    fn test_guard_decrements_on_drop() {
        let counter = UnitCounter::new();
        let guard = counter.add();
        let other = counter.add();
        assert_eq!(counter.outstanding(), 2);

        drop(guard);
        assert_eq!(counter.outstanding(), 1);
        drop(other);
        assert_eq!(counter.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_resolves_immediately_when_empty() {
        let counter = UnitCounter::new();
        tokio::time::timeout(Duration::from_millis(50), counter.wait_idle())
            .await
            .unwrap();
    }

    #[test]
    fn test_wait_idle_pending_while_outstanding() {
        let counter = UnitCounter::new();
        let guard = counter.add();

        let mut wait = tokio_test::task::spawn(counter.wait_idle());
        assert!(wait.poll().is_pending());

        drop(guard);
        assert!(wait.poll().is_ready());
    }

    #[tokio::test]
    async fn test_wait_idle_resolves_after_last_guard() {
        let counter = UnitCounter::new();
        let guard = counter.add();

        let waiter = counter.clone();
        let handle = tokio::spawn(async move {
            waiter.wait_idle().await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_guard_decrements_on_panic() {
        let counter = UnitCounter::new();
        let guard = counter.add();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("unit crashed");
        });
        let _ = handle.await;

        assert_eq!(counter.outstanding(), 0);
    }
}
