//! Outbound observability for a [`UnicastContext`].
//!
//! Obtain a snapshot via [`UnicastContext::stats`](crate::UnicastContext::stats).
//!
//! [`UnicastContext`]: crate::UnicastContext

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of the outbound side of a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Messages accepted by [`OutboundQueue::enqueue`](crate::OutboundQueue::enqueue).
    pub enqueued: u64,
    /// Frames fully written to the destination.
    pub delivered: u64,
    /// Messages dropped because connecting or writing failed.
    pub failed: u64,
    /// Messages still waiting for their release time at shutdown.
    pub dropped_on_shutdown: u64,
}

impl DispatchStats {
    /// messages neither transmitted nor dropped yet
    pub fn pending(&self) -> u64 {
        self.enqueued
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
            .saturating_sub(self.dropped_on_shutdown)
    }
}

/// Counters updated by the queue handles and the dispatcher.
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped_on_shutdown: AtomicU64,
}

/// counters are independent from each other, no ordering with other
/// memory operations is needed
const ORDERING: Ordering = Ordering::Relaxed;

impl DispatchCounters {
    pub(crate) fn enqueued(&self) {
        self.enqueued.fetch_add(1, ORDERING);
    }

    /// undo [`DispatchCounters::enqueued`] when the dispatcher was gone
    pub(crate) fn enqueue_cancelled(&self) {
        self.enqueued.fetch_sub(1, ORDERING);
    }

    pub(crate) fn delivered(&self) {
        self.delivered.fetch_add(1, ORDERING);
    }

    pub(crate) fn failed(&self) {
        self.failed.fetch_add(1, ORDERING);
    }

    pub(crate) fn dropped_on_shutdown(&self, count: u64) {
        self.dropped_on_shutdown.fetch_add(count, ORDERING);
    }

    pub(crate) fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            enqueued: self.enqueued.load(ORDERING),
            delivered: self.delivered.load(ORDERING),
            failed: self.failed.load(ORDERING),
            dropped_on_shutdown: self.dropped_on_shutdown.load(ORDERING),
        }
    }
}
