//! Device commands and their outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::CommandKind;

/// Optional alarm query filters. All fields pass through to the device
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// A command addressed to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    DeviceStatus,
    Catalog,
    Alarm(AlarmQuery),
}

impl DeviceCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            DeviceCommand::DeviceStatus => CommandKind::DeviceStatus,
            DeviceCommand::Catalog => CommandKind::Catalog,
            DeviceCommand::Alarm(_) => CommandKind::Alarm,
        }
    }

    /// Secondary key component. None of the current commands target a
    /// channel, so replies correlate per device and kind.
    pub fn sub_id(&self) -> Option<&str> {
        None
    }

    /// Parameters forwarded to the signaling side.
    pub fn params(&self) -> Value {
        match self {
            DeviceCommand::Alarm(query) => {
                serde_json::to_value(query).unwrap_or_else(|_| Value::Object(Default::default()))
            }
            _ => Value::Object(Default::default()),
        }
    }
}

/// An explicit error reported for a sent command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolFailure {
    /// Protocol status code
    pub code: u16,
    /// Reason phrase
    pub reason: String,
}

impl ProtocolFailure {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProtocolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.code, self.reason)
    }
}

/// Terminal result of one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum CommandOutcome {
    Success(Value),
    Failure(ProtocolFailure),
    TimedOut,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommandOutcome::Success(_) => "success",
            CommandOutcome::Failure(_) => "failure",
            CommandOutcome::TimedOut => "timed_out",
        }
    }
}
