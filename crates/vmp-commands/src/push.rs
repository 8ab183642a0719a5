//! Inbound replies.
//!
//! Device responses arrive out of band and complete the matching slot.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use vmp_devices::{DeviceChannel, DeviceDirectory};

use crate::command::CommandOutcome;
use crate::key::{CommandKind, CorrelationKey};
use crate::registry::PendingRegistry;

/// Completes pending commands from device replies.
#[derive(Clone)]
pub struct PushReceiver {
    registry: PendingRegistry,
    directory: Arc<dyn DeviceDirectory>,
}

impl PushReceiver {
    pub fn new(registry: PendingRegistry, directory: Arc<dyn DeviceDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }

    /// Deliver a success payload for `key`. Returns whether a waiting request
    /// received it.
    ///
    /// Catalog replies carrying a `channels` array are stored in the
    /// directory first, so the waiter reads the refreshed catalog.
    pub async fn deliver(&self, key: &CorrelationKey, payload: Value) -> bool {
        if key.kind() == CommandKind::Catalog {
            self.ingest_catalog(key.device_id(), &payload).await;
        }
        let delivered = self.registry.complete(key, CommandOutcome::Success(payload));
        if !delivered {
            debug!(category = "push", key = %key, "Reply arrived with nobody waiting");
        }
        delivered
    }

    pub async fn on_device_status(&self, device_id: &str, payload: Value) -> bool {
        let key = CorrelationKey::for_command(CommandKind::DeviceStatus, device_id, None);
        self.deliver(&key, payload).await
    }

    pub async fn on_catalog(&self, device_id: &str, payload: Value) -> bool {
        let key = CorrelationKey::for_command(CommandKind::Catalog, device_id, None);
        self.deliver(&key, payload).await
    }

    pub async fn on_alarm(&self, device_id: &str, payload: Value) -> bool {
        let key = CorrelationKey::for_command(CommandKind::Alarm, device_id, None);
        self.deliver(&key, payload).await
    }

    async fn ingest_catalog(&self, device_id: &str, payload: &Value) {
        let Some(channels) = payload.get("channels").and_then(Value::as_array) else {
            return;
        };
        for raw in channels {
            let channel: DeviceChannel = match serde_json::from_value(raw.clone()) {
                Ok(channel) => channel,
                Err(e) => {
                    warn!(category = "push", device_id = %device_id, error = %e, "Skipping malformed catalog entry");
                    continue;
                }
            };
            if let Err(e) = self.directory.update_channel(device_id, channel).await {
                warn!(category = "push", device_id = %device_id, error = %e, "Failed to store catalog entry");
                return;
            }
        }
        debug!(category = "push", device_id = %device_id, count = channels.len(), "Catalog stored");
    }
}
