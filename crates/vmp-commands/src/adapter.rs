//! Protocol adapter seam.
//!
//! An adapter puts a command on the wire. It never returns the reply: success
//! comes back through the push path. What it does return is a
//! [`SendReceipt`] that fires if the transport or the device explicitly
//! rejects the command, and otherwise never fires.

use std::future;

use async_trait::async_trait;
use tokio::sync::oneshot;
use vmp_devices::Device;

use crate::command::{DeviceCommand, ProtocolFailure};
use crate::key::CorrelationKey;

/// Adapter error types.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Outbound queue full")]
    QueueFull,

    #[error("Adapter not connected")]
    NotConnected,
}

/// Transmits commands to devices.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    /// Send `command` to `device`, tagged with `key`.
    ///
    /// `Err` means nothing was transmitted. `Ok` carries the receipt for any
    /// failure reported later.
    async fn send(
        &self,
        device: &Device,
        key: &CorrelationKey,
        command: &DeviceCommand,
    ) -> Result<SendReceipt, AdapterError>;
}

/// Reports the failure of one sent command.
#[derive(Debug)]
pub struct FailureReporter {
    tx: oneshot::Sender<ProtocolFailure>,
}

impl FailureReporter {
    /// Deliver the failure. Returns false if nobody is listening any more.
    pub fn report(self, code: u16, reason: impl Into<String>) -> bool {
        self.tx.send(ProtocolFailure::new(code, reason)).is_ok()
    }

    /// Whether the receipt side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Failure notification for one sent command.
#[derive(Debug)]
pub struct SendReceipt {
    rx: Option<oneshot::Receiver<ProtocolFailure>>,
}

impl SendReceipt {
    /// A connected reporter/receipt pair.
    pub fn channel() -> (FailureReporter, SendReceipt) {
        let (tx, rx) = oneshot::channel();
        (FailureReporter { tx }, SendReceipt { rx: Some(rx) })
    }

    /// A receipt that never yields a failure.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// A receipt that already carries `failure`.
    pub fn failed(failure: ProtocolFailure) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(failure);
        Self { rx: Some(rx) }
    }

    /// Resolve with the reported failure, or stay pending forever if none
    /// is ever reported. Cancel safe; yields at most once.
    pub async fn failure(&mut self) -> ProtocolFailure {
        if let Some(rx) = self.rx.as_mut() {
            let result = rx.await;
            self.rx = None;
            if let Ok(failure) = result {
                return failure;
            }
        }
        future::pending().await
    }
}
