//! Command dispatch.
//!
//! Runs one logical request: look up the device, register a slot, send the
//! command and wait for whichever of failure, push or deadline resolves it.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use vmp_devices::{DeviceDirectory, DirectoryError};

use crate::adapter::{ProtocolAdapter, SendReceipt};
use crate::command::{CommandOutcome, DeviceCommand, ProtocolFailure};
use crate::key::CorrelationKey;
use crate::registry::PendingRegistry;

/// Status code used when the transport could not transmit at all.
pub const TRANSPORT_UNAVAILABLE: u16 = 503;

/// Dispatch error types.
///
/// These are raised before anything is sent. Once a command is out, every
/// result is a [`CommandOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

/// Issues commands and waits for their outcome.
pub struct CommandDispatcher {
    directory: Arc<dyn DeviceDirectory>,
    adapter: Arc<dyn ProtocolAdapter>,
    registry: PendingRegistry,
}

impl CommandDispatcher {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        adapter: Arc<dyn ProtocolAdapter>,
        registry: PendingRegistry,
    ) -> Self {
        Self {
            directory,
            adapter,
            registry,
        }
    }

    pub fn registry(&self) -> &PendingRegistry {
        &self.registry
    }

    /// Send `command` to `device_id` and wait for its outcome.
    pub async fn dispatch(
        &self,
        device_id: &str,
        command: DeviceCommand,
    ) -> Result<CommandOutcome, DispatchError> {
        let device = self
            .directory
            .get_device(device_id)
            .await?
            .ok_or_else(|| DispatchError::DeviceNotFound(device_id.to_string()))?;

        let kind = command.kind();
        let key = CorrelationKey::for_command(kind, device_id, command.sub_id());
        let handle = self.registry.register(key.clone(), kind.timeout());
        let started = Instant::now();

        let mut receipt = match self.adapter.send(&device, &key, &command).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    category = "commands",
                    key = %key,
                    error = %e,
                    "Command could not be sent"
                );
                self.registry.complete(
                    &key,
                    CommandOutcome::Failure(ProtocolFailure::new(TRANSPORT_UNAVAILABLE, e.to_string())),
                );
                SendReceipt::never()
            }
        };
        debug!(category = "commands", key = %key, "Command sent, waiting");

        let wait = handle.wait();
        tokio::pin!(wait);
        let outcome = loop {
            tokio::select! {
                outcome = &mut wait => break outcome,
                failure = receipt.failure() => {
                    warn!(
                        category = "commands",
                        key = %key,
                        code = failure.code,
                        reason = %failure.reason,
                        "Command rejected"
                    );
                    self.registry.complete(&key, CommandOutcome::Failure(failure));
                }
            }
        };

        info!(
            category = "commands",
            key = %key,
            outcome = outcome.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        Ok(outcome)
    }
}
