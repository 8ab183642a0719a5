//! Device and channel records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media stream transport negotiated with a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StreamMode {
    #[default]
    #[serde(rename = "UDP")]
    Udp,
    /// Platform dials the device. Not supported by the media path.
    #[serde(rename = "TCP-ACTIVE")]
    TcpActive,
    /// Device dials the platform.
    #[serde(rename = "TCP-PASSIVE")]
    TcpPassive,
}

impl StreamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Udp => "UDP",
            StreamMode::TcpActive => "TCP-ACTIVE",
            StreamMode::TcpPassive => "TCP-PASSIVE",
        }
    }

    /// Whether the media path can actually serve this mode.
    pub fn is_supported(&self) -> bool {
        !matches!(self, StreamMode::TcpActive)
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream mode parse/validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamModeError {
    #[error("Unknown stream mode: {0}, expected UDP, TCP-ACTIVE or TCP-PASSIVE")]
    Unknown(String),

    #[error("Stream mode {0} is not supported")]
    Unsupported(StreamMode),
}

impl FromStr for StreamMode {
    type Err = StreamModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UDP" => Ok(StreamMode::Udp),
            "TCP-ACTIVE" => Ok(StreamMode::TcpActive),
            "TCP-PASSIVE" => Ok(StreamMode::TcpPassive),
            _ => Err(StreamModeError::Unknown(s.to_string())),
        }
    }
}

/// A registered device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Stable 20-digit device identifier
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub firmware: Option<String>,
    /// Signaling transport, "UDP" or "TCP"
    #[serde(default = "default_transport")]
    pub transport: String,
    #[serde(default)]
    pub stream_mode: StreamMode,
    /// Signaling address of the device
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Online state as last observed; the liveness tracker is authoritative
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub channel_count: usize,
    #[serde(default)]
    pub register_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub keepalive_time: Option<DateTime<Utc>>,
}

fn default_transport() -> String {
    "UDP".to_string()
}

impl Device {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            name: None,
            manufacturer: None,
            model: None,
            firmware: None,
            transport: default_transport(),
            stream_mode: StreamMode::default(),
            host: None,
            port: None,
            online: false,
            channel_count: 0,
            register_time: None,
            keepalive_time: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }
}

/// A channel (camera feed or sub-directory) belonging to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceChannel {
    pub channel_id: String,
    /// Owning device, filled in by the directory on write
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub civil_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// True when this channel is a sub-directory holding other channels
    #[serde(default)]
    pub parental: bool,
    /// Enclosing sub-directory, if any
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Online status reported in the catalog
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub ptz_type: Option<u8>,
    #[serde(default)]
    pub has_audio: bool,
}

impl DeviceChannel {
    pub fn new(device_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            device_id: device_id.into(),
            name: None,
            manufacturer: None,
            model: None,
            owner: None,
            civil_code: None,
            address: None,
            parental: false,
            parent_id: None,
            status: false,
            longitude: None,
            latitude: None,
            ptz_type: None,
            has_audio: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn as_directory(mut self) -> Self {
        self.parental = true;
        self
    }

    pub fn online(mut self, status: bool) -> Self {
        self.status = status;
        self
    }
}

/// Optional channel list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelFilter {
    /// Substring match on channel id or name
    pub query: Option<String>,
    pub online: Option<bool>,
    /// `false` selects plain channels, `true` selects sub-directories
    pub channel_type: Option<bool>,
}

impl ChannelFilter {
    pub fn matches(&self, channel: &DeviceChannel) -> bool {
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            let by_id = channel.channel_id.contains(query);
            let by_name = channel
                .name
                .as_deref()
                .is_some_and(|name| name.contains(query));
            if !by_id && !by_name {
                return false;
            }
        }
        if self.online.is_some_and(|online| channel.status != online) {
            return false;
        }
        self.channel_type
            .is_none_or(|directory| channel.parental == directory)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching records across all pages
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    /// Page size
    pub count: usize,
}

impl<T> Page<T> {
    pub fn empty(page: usize, count: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            count,
        }
    }

    /// Slice `all` into the requested page. Page numbers start at 1; page 0
    /// is treated as 1.
    pub fn slice(all: Vec<T>, page: usize, count: usize) -> Self {
        let total = all.len();
        let page = page.max(1);
        let skip = (page - 1).saturating_mul(count);
        let items = all.into_iter().skip(skip).take(count).collect();
        Self {
            items,
            total,
            page,
            count,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            count: self.count,
        }
    }
}

/// Changes applied to a stored device record.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceUpdate {
    StreamMode(StreamMode),
    Keepalive(DateTime<Utc>),
    Online(bool),
}
