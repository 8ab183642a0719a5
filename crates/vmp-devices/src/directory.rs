//! Device directory seam and its in-memory implementation.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::model::{ChannelFilter, Device, DeviceChannel, DeviceUpdate, Page};

/// Directory error types.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Channel not found: {device_id}/{channel_id}")]
    ChannelNotFound {
        device_id: String,
        channel_id: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DirectoryError::DeviceNotFound(_) | DirectoryError::ChannelNotFound { .. }
        )
    }
}

impl From<vmp_core::Error> for DirectoryError {
    fn from(e: vmp_core::Error) -> Self {
        DirectoryError::Storage(e.to_string())
    }
}

/// Device and channel lookup.
///
/// Reads return `Ok(None)` for absent records; `Err` is reserved for the
/// store itself failing.
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn get_device(&self, device_id: &str) -> Result<Option<Device>, DirectoryError>;

    async fn list_devices(&self, page: usize, count: usize) -> Result<Page<Device>, DirectoryError>;

    async fn list_channels(
        &self,
        device_id: &str,
        filter: &ChannelFilter,
        page: usize,
        count: usize,
    ) -> Result<Page<DeviceChannel>, DirectoryError>;

    async fn get_channel(
        &self,
        device_id: &str,
        channel_id: &str,
    ) -> Result<Option<DeviceChannel>, DirectoryError>;

    /// Channels directly under the sub-directory `channel_id`.
    async fn list_sub_channels(
        &self,
        device_id: &str,
        channel_id: &str,
        filter: &ChannelFilter,
        page: usize,
        count: usize,
    ) -> Result<Page<DeviceChannel>, DirectoryError>;

    /// Insert or replace a channel of `device_id`.
    async fn update_channel(
        &self,
        device_id: &str,
        channel: DeviceChannel,
    ) -> Result<DeviceChannel, DirectoryError>;

    /// Apply `update` to the stored record and return the new snapshot.
    async fn apply(&self, device_id: &str, update: DeviceUpdate) -> Result<Device, DirectoryError>;

    /// Remove a device and its channels. Returns whether it existed.
    async fn delete_device(&self, device_id: &str) -> Result<bool, DirectoryError>;
}

/// Seed file contents for [`MemoryDirectory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub channels: Vec<DeviceChannel>,
}

#[derive(Default)]
struct Inner {
    devices: HashMap<String, Device>,
    /// device_id -> channel_id -> channel
    channels: HashMap<String, HashMap<String, DeviceChannel>>,
}

impl Inner {
    fn channel_count(&self, device_id: &str) -> usize {
        self.channels.get(device_id).map_or(0, HashMap::len)
    }

    fn sorted_channels(
        &self,
        device_id: &str,
        pred: impl Fn(&DeviceChannel) -> bool,
    ) -> Vec<DeviceChannel> {
        let mut channels: Vec<DeviceChannel> = self
            .channels
            .get(device_id)
            .into_iter()
            .flat_map(|m| m.values())
            .filter(|c| pred(*c))
            .cloned()
            .collect();
        channels.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        channels
    }
}

/// In-memory device directory.
#[derive(Default)]
pub struct MemoryDirectory {
    inner: RwLock<Inner>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory pre-populated from `seed`.
    pub async fn from_seed(seed: SeedData) -> Self {
        let directory = Self::new();
        for device in seed.devices {
            directory.insert_device(device).await;
        }
        for channel in seed.channels {
            let device_id = channel.device_id.clone();
            directory.insert_channel(&device_id, channel).await;
        }
        directory
    }

    /// Load a JSON seed file.
    pub async fn load_seed(path: &Path) -> Result<Self, vmp_core::Error> {
        let content = tokio::fs::read_to_string(path).await?;
        let seed: SeedData = serde_json::from_str(&content)?;
        info!(
            category = "devices",
            devices = seed.devices.len(),
            channels = seed.channels.len(),
            "Loaded seed from: {}",
            path.display()
        );
        Ok(Self::from_seed(seed).await)
    }

    /// Insert or replace a device record.
    pub async fn insert_device(&self, mut device: Device) {
        let mut inner = self.inner.write().await;
        device.channel_count = inner.channel_count(&device.device_id);
        inner.devices.insert(device.device_id.clone(), device);
    }

    /// Insert or replace a channel.
    pub async fn insert_channel(&self, device_id: &str, mut channel: DeviceChannel) {
        channel.device_id = device_id.to_string();
        let mut inner = self.inner.write().await;
        inner
            .channels
            .entry(device_id.to_string())
            .or_default()
            .insert(channel.channel_id.clone(), channel);
        let count = inner.channel_count(device_id);
        if let Some(device) = inner.devices.get_mut(device_id) {
            device.channel_count = count;
        }
    }
}

#[async_trait]
impl DeviceDirectory for MemoryDirectory {
    async fn get_device(&self, device_id: &str) -> Result<Option<Device>, DirectoryError> {
        Ok(self.inner.read().await.devices.get(device_id).cloned())
    }

    async fn list_devices(&self, page: usize, count: usize) -> Result<Page<Device>, DirectoryError> {
        let inner = self.inner.read().await;
        let mut devices: Vec<Device> = inner.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(Page::slice(devices, page, count))
    }

    async fn list_channels(
        &self,
        device_id: &str,
        filter: &ChannelFilter,
        page: usize,
        count: usize,
    ) -> Result<Page<DeviceChannel>, DirectoryError> {
        let inner = self.inner.read().await;
        let channels = inner.sorted_channels(device_id, |c| filter.matches(c));
        Ok(Page::slice(channels, page, count))
    }

    async fn get_channel(
        &self,
        device_id: &str,
        channel_id: &str,
    ) -> Result<Option<DeviceChannel>, DirectoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .channels
            .get(device_id)
            .and_then(|m| m.get(channel_id))
            .cloned())
    }

    async fn list_sub_channels(
        &self,
        device_id: &str,
        channel_id: &str,
        filter: &ChannelFilter,
        page: usize,
        count: usize,
    ) -> Result<Page<DeviceChannel>, DirectoryError> {
        let inner = self.inner.read().await;
        let channels = inner.sorted_channels(device_id, |c| {
            c.parent_id.as_deref() == Some(channel_id) && filter.matches(c)
        });
        Ok(Page::slice(channels, page, count))
    }

    async fn update_channel(
        &self,
        device_id: &str,
        channel: DeviceChannel,
    ) -> Result<DeviceChannel, DirectoryError> {
        if !self.inner.read().await.devices.contains_key(device_id) {
            return Err(DirectoryError::DeviceNotFound(device_id.to_string()));
        }
        let mut channel = channel;
        channel.device_id = device_id.to_string();
        self.insert_channel(device_id, channel.clone()).await;
        debug!(
            category = "devices",
            device_id = %device_id,
            channel_id = %channel.channel_id,
            "Channel updated"
        );
        Ok(channel)
    }

    async fn apply(&self, device_id: &str, update: DeviceUpdate) -> Result<Device, DirectoryError> {
        let mut inner = self.inner.write().await;
        let device = inner
            .devices
            .get_mut(device_id)
            .ok_or_else(|| DirectoryError::DeviceNotFound(device_id.to_string()))?;
        match update {
            DeviceUpdate::StreamMode(mode) => device.stream_mode = mode,
            DeviceUpdate::Keepalive(at) => {
                device.keepalive_time = Some(at);
                device.online = true;
            }
            DeviceUpdate::Online(online) => device.online = online,
        }
        Ok(device.clone())
    }

    async fn delete_device(&self, device_id: &str) -> Result<bool, DirectoryError> {
        let mut inner = self.inner.write().await;
        inner.channels.remove(device_id);
        let existed = inner.devices.remove(device_id).is_some();
        if existed {
            info!(category = "devices", device_id = %device_id, "Device deleted");
        }
        Ok(existed)
    }
}
