//! Common test utilities for API tests.

use std::sync::Arc;

use vmp_api::ServerState;
use vmp_core::ServerConfig;
use vmp_devices::{Device, DeviceChannel, MemoryDirectory};

pub const DEVICE: &str = "34020000001320000001";
pub const OTHER_DEVICE: &str = "34020000001320000002";
pub const FOLDER: &str = "34020000002160000001";

/// Server state over a small seeded directory.
pub async fn create_test_server_state() -> ServerState {
    let directory = MemoryDirectory::new();
    directory
        .insert_device(Device::new(DEVICE).with_name("North gate").with_address("10.0.0.7", 5060))
        .await;
    directory.insert_device(Device::new(OTHER_DEVICE)).await;

    directory
        .insert_channel(
            DEVICE,
            DeviceChannel::new(DEVICE, "34020000001310000001")
                .with_name("Lobby")
                .online(true),
        )
        .await;
    directory
        .insert_channel(
            DEVICE,
            DeviceChannel::new(DEVICE, "34020000001310000002").with_name("Dock"),
        )
        .await;
    directory
        .insert_channel(
            DEVICE,
            DeviceChannel::new(DEVICE, FOLDER).with_name("Floor 2").as_directory(),
        )
        .await;
    directory
        .insert_channel(
            DEVICE,
            DeviceChannel::new(DEVICE, "34020000001310000003")
                .with_parent(FOLDER)
                .online(true),
        )
        .await;

    ServerState::new(&ServerConfig::default(), Arc::new(directory))
}
