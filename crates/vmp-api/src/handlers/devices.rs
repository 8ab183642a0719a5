//! Device record handlers.

use axum::extract::{Path, Query, State};
use serde_json::{Value, json};
use vmp_devices::{Device, DeviceUpdate, LivenessTracker, StreamMode, StreamModeError};

use super::{
    ServerState,
    common::{HandlerResult, PageQuery, ok, ok_with_meta},
};
use crate::models::{ErrorResponse, PaginationMeta};

/// Stamp the live online state onto a stored record.
fn with_liveness(state: &ServerState, mut device: Device) -> Device {
    device.online = state.liveness.is_online(&device.device_id);
    device
}

/// List devices page by page.
///
/// GET /api/device/query/devices?page=&count=
pub async fn list_devices_handler(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> HandlerResult<Vec<Device>> {
    tracing::debug!(category = "api", "List devices API called");
    let query = query.validate()?;
    let page = state
        .directory
        .list_devices(query.page, query.count)
        .await?
        .map(|d| with_liveness(&state, d));
    let meta = PaginationMeta::from_page(&page);
    ok_with_meta(page.items, meta)
}

/// Get one device.
///
/// GET /api/device/query/devices/:device_id
pub async fn get_device_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
) -> HandlerResult<Device> {
    tracing::debug!(category = "api", device_id = %device_id, "Get device API called");
    let device = state
        .directory
        .get_device(&device_id)
        .await?
        .ok_or_else(|| ErrorResponse::not_found(format!("Device {}", device_id)))?;
    ok(with_liveness(&state, device))
}

/// Delete an offline device and its channels.
///
/// DELETE /api/device/query/devices/:device_id/delete
pub async fn delete_device_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
) -> HandlerResult<Value> {
    tracing::debug!(category = "api", device_id = %device_id, "Delete device API called");

    if state.liveness.is_online(&device_id) {
        return Err(ErrorResponse::not_acceptable(
            "Online devices may not be deleted",
        ));
    }
    if !state.directory.delete_device(&device_id).await? {
        return Err(ErrorResponse::not_found(format!("Device {}", device_id)));
    }
    ok(json!({ "deviceId": device_id }))
}

/// Change the media stream transport of a device.
///
/// POST /api/device/query/transport/:device_id/:stream_mode
pub async fn update_transport_handler(
    State(state): State<ServerState>,
    Path((device_id, stream_mode)): Path<(String, String)>,
) -> HandlerResult<Device> {
    tracing::debug!(
        category = "api",
        device_id = %device_id,
        stream_mode = %stream_mode,
        "Update transport API called"
    );

    let mode: StreamMode = stream_mode
        .parse()
        .map_err(|e: StreamModeError| ErrorResponse::bad_request(e.to_string()))?;
    if !mode.is_supported() {
        return Err(ErrorResponse::validation(
            StreamModeError::Unsupported(mode).to_string(),
        ));
    }

    let device = state
        .directory
        .apply(&device_id, DeviceUpdate::StreamMode(mode))
        .await?;
    tracing::info!(
        category = "devices",
        device_id = %device_id,
        stream_mode = %mode,
        "Stream mode changed"
    );
    ok(with_liveness(&state, device))
}
