//! Command/response correlation for the VMP device query service.
//!
//! Devices answer over an asynchronous signaling protocol: a command goes out
//! now and its reply, if any, arrives later on a separate path. This crate
//! makes that look like a request/response call:
//!
//! - [`CorrelationKey`] binds an outbound command to its eventual reply
//! - [`PendingRegistry`] parks one waiter per key until the reply, an explicit
//!   failure or the deadline resolves it, exactly once
//! - [`CommandDispatcher`] runs one logical request end to end
//! - [`PushReceiver`] is where replies come back in
//! - [`QueuedAdapter`] hands commands to an external signaling gateway

pub mod adapter;
pub mod command;
pub mod dispatcher;
pub mod gateway;
pub mod key;
pub mod push;
pub mod registry;
pub mod slot;

pub use adapter::{AdapterError, FailureReporter, ProtocolAdapter, SendReceipt};
pub use command::{AlarmQuery, CommandOutcome, DeviceCommand, ProtocolFailure};
pub use dispatcher::{CommandDispatcher, DispatchError};
pub use gateway::{OutboundCommand, QueuedAdapter};
pub use key::{CommandKind, CorrelationKey, KeyParseError};
pub use push::PushReceiver;
pub use registry::{PendingRegistry, RegistryStats};
pub use slot::PendingHandle;
