//! Shared server state.

use std::sync::Arc;
use std::time::Duration;

use vmp_commands::{CommandDispatcher, PendingRegistry, PushReceiver, QueuedAdapter};
use vmp_core::ServerConfig;
use vmp_devices::{DeviceDirectory, MemoryDirectory, OnlineRegistry};

/// Server state shared by all handlers.
///
/// The pending registry is created here once and handed to every component
/// that resolves or waits on commands.
#[derive(Clone)]
pub struct ServerState {
    /// Device and channel records
    pub directory: Arc<dyn DeviceDirectory>,
    /// Keepalive-driven online state
    pub liveness: Arc<OnlineRegistry>,
    /// In-flight command slots
    pub registry: PendingRegistry,
    pub dispatcher: Arc<CommandDispatcher>,
    /// Entry point for device replies
    pub push: PushReceiver,
    /// Outbound queue drained by the signaling gateway
    pub gateway: Arc<QueuedAdapter>,
    /// Server start time (unix seconds)
    pub started_at: i64,
}

impl ServerState {
    pub fn new(config: &ServerConfig, directory: Arc<dyn DeviceDirectory>) -> Self {
        let registry = PendingRegistry::new();
        let gateway = Arc::new(QueuedAdapter::new(config.gateway_queue_capacity));
        let dispatcher = Arc::new(CommandDispatcher::new(
            directory.clone(),
            gateway.clone(),
            registry.clone(),
        ));
        let push = PushReceiver::new(registry.clone(), directory.clone());

        Self {
            directory,
            liveness: Arc::new(OnlineRegistry::new(Duration::from_secs(
                config.heartbeat_timeout_secs,
            ))),
            registry,
            dispatcher,
            push,
            gateway,
            started_at: chrono::Utc::now().timestamp(),
        }
    }

    /// State over an empty in-memory directory.
    pub fn in_memory(config: &ServerConfig) -> Self {
        Self::new(config, Arc::new(MemoryDirectory::new()))
    }
}
