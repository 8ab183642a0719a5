//! Queue-backed adapter for an external signaling gateway.
//!
//! The gateway process owns the wire protocol. It pulls [`OutboundCommand`]s
//! from the queue, transmits them, and reports rejections back by key.
//! Replies go through the push path.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;
use vmp_devices::Device;

use crate::adapter::{AdapterError, FailureReporter, ProtocolAdapter, SendReceipt};
use crate::command::DeviceCommand;
use crate::key::{CommandKind, CorrelationKey};

/// A command waiting to be picked up by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundCommand {
    /// Unique per send, for gateway-side logging
    pub id: Uuid,
    pub key: CorrelationKey,
    pub device_id: String,
    pub kind: CommandKind,
    pub params: Value,
    pub transport: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub issued_at: DateTime<Utc>,
}

/// [`ProtocolAdapter`] that enqueues commands for the gateway.
pub struct QueuedAdapter {
    tx: mpsc::Sender<OutboundCommand>,
    rx: Mutex<mpsc::Receiver<OutboundCommand>>,
    /// Reporters for commands sent but not yet answered
    reporters: DashMap<CorrelationKey, FailureReporter>,
}

impl QueuedAdapter {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(rx),
            reporters: DashMap::new(),
        }
    }

    /// Take the next queued command, waiting up to `wait` for one.
    ///
    /// Commands whose request already finished are discarded, not handed out.
    pub async fn next(&self, wait: Duration) -> Option<OutboundCommand> {
        let deadline = Instant::now() + wait;
        let mut rx = self.rx.lock().await;
        loop {
            let command = tokio::time::timeout_at(deadline, rx.recv()).await.ok().flatten()?;
            self.prune();
            if self.is_awaited(&command.key) {
                return Some(command);
            }
            debug!(
                category = "gateway",
                key = %command.key,
                "Discarding command nobody waits for"
            );
        }
    }

    /// Report that the command sent under `key` was rejected. Returns false
    /// when no request is waiting on that key.
    pub fn report_failure(&self, key: &CorrelationKey, code: u16, reason: impl Into<String>) -> bool {
        self.prune();
        match self.reporters.remove(key) {
            Some((_, reporter)) => reporter.report(code, reason),
            None => false,
        }
    }

    /// Commands queued and not yet taken.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Commands sent whose requests are still waiting.
    pub fn in_flight(&self) -> usize {
        self.reporters.iter().filter(|r| !r.value().is_closed()).count()
    }

    fn is_awaited(&self, key: &CorrelationKey) -> bool {
        self.reporters.get(key).is_some_and(|r| !r.is_closed())
    }

    fn prune(&self) {
        self.reporters.retain(|_, reporter| !reporter.is_closed());
    }
}

#[async_trait]
impl ProtocolAdapter for QueuedAdapter {
    async fn send(
        &self,
        device: &Device,
        key: &CorrelationKey,
        command: &DeviceCommand,
    ) -> Result<SendReceipt, AdapterError> {
        self.prune();

        let outbound = OutboundCommand {
            id: Uuid::new_v4(),
            key: key.clone(),
            device_id: device.device_id.clone(),
            kind: command.kind(),
            params: command.params(),
            transport: device.transport.clone(),
            host: device.host.clone(),
            port: device.port,
            issued_at: Utc::now(),
        };

        // Reporter goes in before the command is visible to the gateway.
        let (reporter, receipt) = SendReceipt::channel();
        self.reporters.insert(key.clone(), reporter);

        match self.tx.try_send(outbound) {
            Ok(()) => {
                debug!(category = "gateway", key = %key, "Command queued");
                Ok(receipt)
            }
            Err(e) => {
                self.reporters.remove(key);
                warn!(category = "gateway", key = %key, "Outbound queue rejected command");
                match e {
                    mpsc::error::TrySendError::Full(_) => Err(AdapterError::QueueFull),
                    mpsc::error::TrySendError::Closed(_) => Err(AdapterError::NotConnected),
                }
            }
        }
    }
}
