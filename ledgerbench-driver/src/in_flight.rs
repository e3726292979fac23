//! Tracking of operations that are awaiting the target adapter.
//!
//! [`InFlight`] counts outstanding submissions of one driver. Each [`InFlightGuard`] decrements
//! the count and notifies waiters on drop, so abandoned operation futures are released as well.
//! [`InFlight::wait_idle`] resolves once all guards have been dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Notify;

/// Counts in-flight operations of a single driver.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: AtomicU64,
    released: Notify,
}

impl InFlight {
    /// Registers a new in-flight operation.
    pub(crate) fn track(&self) -> InFlightGuard<'_> {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard { tracker: self }
    }

    /// Returns the number of operations currently in flight.
    pub(crate) fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Waits until no operation is in flight.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.released.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks one operation as in flight until dropped.
#[derive(Debug)]
pub(crate) struct InFlightGuard<'a> {
    tracker: &'a InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.tracker.count.fetch_sub(1, Ordering::SeqCst);
        self.tracker.released.notify_waiters();
    }
}
