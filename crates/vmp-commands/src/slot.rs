//! Completion slots.
//!
//! A slot holds the single outcome of one registration. The outcome cell is
//! write-once, so whichever of failure, push or deadline gets there first is
//! the only one that ever counts.

use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;
use tokio::time::{Instant, sleep_until};

use crate::command::CommandOutcome;
use crate::key::CorrelationKey;
use crate::registry::RegistryShared;

pub(crate) struct SlotCell {
    pub(crate) key: CorrelationKey,
    /// Distinguishes this registration from a later one under the same key
    pub(crate) seq: u64,
    pub(crate) deadline: Instant,
    outcome: OnceLock<CommandOutcome>,
    notify: Notify,
}

impl SlotCell {
    pub(crate) fn new(key: CorrelationKey, seq: u64, deadline: Instant) -> Self {
        Self {
            key,
            seq,
            deadline,
            outcome: OnceLock::new(),
            notify: Notify::new(),
        }
    }

    /// Set the outcome if still unset and wake the waiter.
    pub(crate) fn resolve(&self, outcome: CommandOutcome) -> bool {
        if self.outcome.set(outcome).is_ok() {
            // notify_one stores a permit when nobody is waiting yet
            self.notify.notify_one();
            true
        } else {
            false
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }
}

/// The waiter side of one registration.
///
/// Dropping an unresolved handle withdraws its registry entry.
pub struct PendingHandle {
    cell: Arc<SlotCell>,
    shared: Arc<RegistryShared>,
}

impl PendingHandle {
    pub(crate) fn new(cell: Arc<SlotCell>, shared: Arc<RegistryShared>) -> Self {
        Self { cell, shared }
    }

    pub fn key(&self) -> &CorrelationKey {
        &self.cell.key
    }

    pub fn deadline(&self) -> Instant {
        self.cell.deadline
    }

    /// Suspend until the slot resolves.
    ///
    /// The deadline timer lives in this future, so it only runs while someone
    /// is waiting and is dropped as soon as another source resolves the slot.
    pub async fn wait(self) -> CommandOutcome {
        loop {
            if let Some(outcome) = self.cell.outcome.get() {
                return outcome.clone();
            }

            tokio::select! {
                biased;
                _ = self.cell.notify.notified() => {}
                _ = sleep_until(self.cell.deadline) => {
                    self.shared.time_out(&self.cell);
                }
            }
        }
    }
}

impl Drop for PendingHandle {
    fn drop(&mut self) {
        if !self.cell.is_resolved() {
            self.shared.abandon(&self.cell);
        }
    }
}

impl std::fmt::Debug for PendingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingHandle")
            .field("key", &self.cell.key.to_string())
            .field("seq", &self.cell.seq)
            .field("resolved", &self.cell.is_resolved())
            .finish()
    }
}
