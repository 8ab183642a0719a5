//! Device online/offline tracking.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info};

/// Answers whether a device is currently reachable.
pub trait LivenessTracker: Send + Sync {
    fn is_online(&self, device_id: &str) -> bool;
}

/// Keepalive-driven liveness.
///
/// A device is online from its first keepalive until either an explicit
/// offline notice or `heartbeat_timeout` without another keepalive.
pub struct OnlineRegistry {
    last_seen: DashMap<String, Instant>,
    heartbeat_timeout: Duration,
}

impl OnlineRegistry {
    pub fn new(heartbeat_timeout: Duration) -> Self {
        Self {
            last_seen: DashMap::new(),
            heartbeat_timeout,
        }
    }

    /// Record a keepalive (or registration) from `device_id`.
    pub fn keepalive(&self, device_id: &str) {
        let was_online = self.is_online(device_id);
        self.last_seen.insert(device_id.to_string(), Instant::now());
        if !was_online {
            info!(category = "liveness", device_id = %device_id, "Device online");
        }
    }

    /// Explicit offline notice, e.g. unregister.
    pub fn mark_offline(&self, device_id: &str) {
        if self.last_seen.remove(device_id).is_some() {
            info!(category = "liveness", device_id = %device_id, "Device offline");
        }
    }

    /// Drop every entry whose heartbeat has lapsed. Returns the removed ids.
    pub fn sweep(&self) -> Vec<String> {
        let mut expired = Vec::new();
        self.last_seen.retain(|id, seen| {
            let alive = seen.elapsed() < self.heartbeat_timeout;
            if !alive {
                expired.push(id.clone());
            }
            alive
        });
        if !expired.is_empty() {
            debug!(category = "liveness", count = expired.len(), "Heartbeats lapsed");
        }
        expired
    }

    pub fn online_count(&self) -> usize {
        self.last_seen
            .iter()
            .filter(|e| e.value().elapsed() < self.heartbeat_timeout)
            .count()
    }
}

impl LivenessTracker for OnlineRegistry {
    fn is_online(&self, device_id: &str) -> bool {
        self.last_seen
            .get(device_id)
            .is_some_and(|seen| seen.elapsed() < self.heartbeat_timeout)
    }
}
