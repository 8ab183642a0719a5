//! Pending result registry.
//!
//! Maps each correlation key to its live completion slot. One instance per
//! process, constructed by the server and shared by the dispatcher, the push
//! path and the facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::command::CommandOutcome;
use crate::key::CorrelationKey;
use crate::slot::{PendingHandle, SlotCell};

/// Registry counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Slots currently mapped
    pub in_flight: usize,
    pub registered: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Slots displaced by a reissue of the same key
    pub orphaned: u64,
    /// Completions that found no live slot
    pub unmatched: u64,
    /// Waiters that went away before resolution
    pub abandoned: u64,
}

#[derive(Default)]
struct Counters {
    registered: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    orphaned: AtomicU64,
    unmatched: AtomicU64,
    abandoned: AtomicU64,
}

impl Counters {
    fn for_outcome(&self, outcome: &CommandOutcome) -> &AtomicU64 {
        match outcome {
            CommandOutcome::Success(_) => &self.succeeded,
            CommandOutcome::Failure(_) => &self.failed,
            CommandOutcome::TimedOut => &self.timed_out,
        }
    }
}

pub(crate) struct RegistryShared {
    slots: DashMap<CorrelationKey, Arc<SlotCell>>,
    next_seq: AtomicU64,
    counters: Counters,
}

impl RegistryShared {
    /// Deadline reached: resolve the cell as timed out unless something beat
    /// us to it, then unmap it if it is still the mapped registration.
    pub(crate) fn time_out(&self, cell: &SlotCell) {
        if cell.resolve(CommandOutcome::TimedOut) {
            self.counters.timed_out.fetch_add(1, Ordering::Relaxed);
            let unmapped = self
                .slots
                .remove_if(&cell.key, |_, mapped| mapped.seq == cell.seq)
                .is_some();
            warn!(
                category = "commands",
                key = %cell.key,
                orphan = !unmapped,
                "Command timed out"
            );
        }
    }

    /// Waiter dropped before resolution.
    pub(crate) fn abandon(&self, cell: &SlotCell) {
        if self
            .slots
            .remove_if(&cell.key, |_, mapped| mapped.seq == cell.seq)
            .is_some()
        {
            self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
            debug!(category = "commands", key = %cell.key, "Waiter dropped, slot withdrawn");
        }
    }
}

/// Concurrent key to slot map.
#[derive(Clone)]
pub struct PendingRegistry {
    shared: Arc<RegistryShared>,
}

impl Default for PendingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                slots: DashMap::new(),
                next_seq: AtomicU64::new(0),
                counters: Counters::default(),
            }),
        }
    }

    /// Create a slot for `key` due `timeout` from now.
    ///
    /// A live slot already mapped under `key` is displaced. It stays reachable
    /// only through its own handle and will resolve as timed out.
    pub fn register(&self, key: CorrelationKey, timeout: Duration) -> PendingHandle {
        let seq = self.shared.next_seq.fetch_add(1, Ordering::Relaxed);
        let cell = Arc::new(SlotCell::new(key.clone(), seq, Instant::now() + timeout));

        self.shared.counters.registered.fetch_add(1, Ordering::Relaxed);
        let displaced = self.shared.slots.insert(key, cell.clone());
        if displaced.is_some_and(|previous| !previous.is_resolved()) {
            self.shared.counters.orphaned.fetch_add(1, Ordering::Relaxed);
            warn!(
                category = "commands",
                key = %cell.key,
                "Command reissued before reply, earlier request orphaned"
            );
        }
        debug!(
            category = "commands",
            key = %cell.key,
            timeout_ms = timeout.as_millis() as u64,
            "Slot registered"
        );

        PendingHandle::new(cell, self.shared.clone())
    }

    /// Resolve the live slot for `key`. Returns whether this call resolved it;
    /// unknown or already resolved keys are a no-op.
    pub fn complete(&self, key: &CorrelationKey, outcome: CommandOutcome) -> bool {
        let label = outcome.label();
        let counter = self.shared.counters.for_outcome(&outcome);
        // Resolve inside the shard lock so assignment and removal are one step.
        let resolved = self
            .shared
            .slots
            .remove_if(key, |_, cell| cell.resolve(outcome))
            .is_some();

        if resolved {
            counter.fetch_add(1, Ordering::Relaxed);
            debug!(category = "commands", key = %key, outcome = label, "Slot resolved");
        } else {
            self.shared.counters.unmatched.fetch_add(1, Ordering::Relaxed);
            debug!(category = "commands", key = %key, outcome = label, "No pending slot for key");
        }
        resolved
    }

    /// Resolve the live slot for `key` as timed out.
    pub fn expire(&self, key: &CorrelationKey) -> bool {
        self.complete(key, CommandOutcome::TimedOut)
    }

    pub fn len(&self) -> usize {
        self.shared.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.slots.is_empty()
    }

    pub fn is_pending(&self, key: &CorrelationKey) -> bool {
        self.shared.slots.contains_key(key)
    }

    pub fn stats(&self) -> RegistryStats {
        let c = &self.shared.counters;
        RegistryStats {
            in_flight: self.len(),
            registered: c.registered.load(Ordering::Relaxed),
            succeeded: c.succeeded.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            timed_out: c.timed_out.load(Ordering::Relaxed),
            orphaned: c.orphaned.load(Ordering::Relaxed),
            unmatched: c.unmatched.load(Ordering::Relaxed),
            abandoned: c.abandoned.load(Ordering::Relaxed),
        }
    }
}
