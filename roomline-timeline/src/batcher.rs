//! Debounce accumulator for incoming diffs.
//!
//! The batcher only tracks state: which operations are pending and when the
//! current collection window closes. The timeline task decides when to poll
//! the clock, which keeps the window logic independent of how the task is
//! scheduled.

use std::{mem, time::Duration};

use tokio::time::Instant;

use crate::models::DiffOperation;

// Roughly thirty years; stands in for a window too long to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug)]
pub struct DiffBatcher {
    window: Duration,
    pending: Vec<DiffOperation>,
    deadline: Option<Instant>,
}

impl DiffBatcher {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Vec::new(),
            deadline: None,
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Queues `op`; the first operation received while idle opens a window
    /// that closes `window` after `now`.
    ///
    /// A window that overflows the clock closes in the far future instead.
    pub fn push(&mut self, op: DiffOperation, now: Instant) {
        if self.deadline.is_none() {
            let deadline = now
                .checked_add(self.window)
                .or_else(|| now.checked_add(FAR_FUTURE))
                .unwrap_or(now);
            self.deadline = Some(deadline);
        }
        self.pending.push(op);
    }

    /// When the open window closes, or `None` while idle.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.deadline.is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Closes the window and hands out the batch in arrival order.
    pub fn take(&mut self) -> Vec<DiffOperation> {
        self.deadline = None;
        mem::take(&mut self.pending)
    }

    /// Drops the pending batch without applying it; returns how many
    /// operations were abandoned.
    pub fn discard(&mut self) -> usize {
        self.take().len()
    }
}
