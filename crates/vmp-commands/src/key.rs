//! Correlation keys.
//!
//! A key is derived from `(kind, device id, optional sub id)` and is the only
//! thing the outbound and inbound paths share. Both sides must build it with
//! [`CorrelationKey::for_command`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vmp_core::config::timeouts;

/// Command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Device status query
    DeviceStatus,
    /// Channel catalog sync
    Catalog,
    /// Alarm query
    Alarm,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::DeviceStatus => "status",
            CommandKind::Catalog => "catalog",
            CommandKind::Alarm => "alarm",
        }
    }

    /// Fixed response deadline for this kind.
    pub fn timeout(&self) -> Duration {
        let ms = match self {
            CommandKind::DeviceStatus => timeouts::DEVICE_STATUS_MS,
            CommandKind::Catalog => timeouts::CATALOG_MS,
            CommandKind::Alarm => timeouts::ALARM_MS,
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(CommandKind::DeviceStatus),
            "catalog" => Ok(CommandKind::Catalog),
            "alarm" => Ok(CommandKind::Alarm),
            other => Err(KeyParseError::UnknownKind(other.to_string())),
        }
    }
}

/// Key parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("Unknown command kind: {0}")]
    UnknownKind(String),

    #[error("Malformed correlation key: {0}")]
    Malformed(String),
}

/// Identifies one in-flight command.
///
/// Renders as `kind:device[:sub]` with each id percent-encoded, so distinct
/// keys never render to the same string and the rendering parses back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    kind: CommandKind,
    device_id: String,
    sub_id: Option<String>,
}

impl CorrelationKey {
    pub fn for_command(kind: CommandKind, device_id: impl Into<String>, sub_id: Option<&str>) -> Self {
        Self {
            kind,
            device_id: device_id.into(),
            sub_id: sub_id.map(str::to_string),
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn sub_id(&self) -> Option<&str> {
        self.sub_id.as_deref()
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, urlencoding::encode(&self.device_id))?;
        if let Some(sub) = &self.sub_id {
            write!(f, ":{}", urlencoding::encode(sub))?;
        }
        Ok(())
    }
}

impl FromStr for CorrelationKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || KeyParseError::Malformed(s.to_string());
        let decode = |part: &str| {
            urlencoding::decode(part)
                .map(|d| d.into_owned())
                .map_err(|_| malformed())
        };

        let mut parts = s.split(':');
        let kind: CommandKind = parts.next().ok_or_else(malformed)?.parse()?;
        let device_id = decode(parts.next().ok_or_else(malformed)?)?;
        let sub_id = parts.next().map(decode).transpose()?;
        if parts.next().is_some() || device_id.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            kind,
            device_id,
            sub_id,
        })
    }
}

impl Serialize for CorrelationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CorrelationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
