//! Signaling gateway handlers.
//!
//! The gateway process long-polls for outbound commands, transmits them, and
//! reports back rejections, replies and device liveness. `:key` is the
//! rendered correlation key, percent-encoded as a path segment.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vmp_commands::{CorrelationKey, OutboundCommand};
use vmp_core::config::timeouts;
use vmp_devices::DeviceUpdate;

use super::{
    ServerState,
    common::{HandlerResult, ok},
};
use crate::models::ErrorResponse;

/// Long-poll parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct NextCommandQuery {
    /// How long to wait for a command, capped server side.
    #[serde(default)]
    pub wait_ms: u64,
}

/// Failure report body.
#[derive(Debug, Clone, Deserialize)]
pub struct FailureReport {
    pub code: u16,
    #[serde(default)]
    pub reason: String,
}

/// Delivery result.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub key: CorrelationKey,
    /// Whether a waiting request received it
    pub delivered: bool,
}

fn parse_key(raw: &str) -> Result<CorrelationKey, ErrorResponse> {
    raw.parse().map_err(ErrorResponse::from)
}

/// Take the next outbound command, or `null` if none arrived in time.
///
/// GET /api/gateway/commands/next?wait_ms=
pub async fn next_command_handler(
    State(state): State<ServerState>,
    Query(query): Query<NextCommandQuery>,
) -> HandlerResult<Option<OutboundCommand>> {
    let wait = Duration::from_millis(query.wait_ms.min(timeouts::GATEWAY_POLL_MAX_MS));
    ok(state.gateway.next(wait).await)
}

/// Report that the device or transport rejected a command.
///
/// POST /api/gateway/commands/:key/failure
pub async fn report_failure_handler(
    State(state): State<ServerState>,
    Path(key): Path<String>,
    Json(report): Json<FailureReport>,
) -> HandlerResult<Delivery> {
    let key = parse_key(&key)?;
    tracing::debug!(
        category = "gateway",
        key = %key,
        code = report.code,
        "Failure reported"
    );
    if !state.gateway.report_failure(&key, report.code, report.reason) {
        return Err(ErrorResponse::not_found(format!("Pending command {}", key)));
    }
    ok(Delivery {
        key,
        delivered: true,
    })
}

/// Deliver a device reply.
///
/// POST /api/gateway/push/:key
pub async fn push_handler(
    State(state): State<ServerState>,
    Path(key): Path<String>,
    Json(payload): Json<Value>,
) -> HandlerResult<Delivery> {
    let key = parse_key(&key)?;
    let delivered = state.push.deliver(&key, payload).await;
    ok(Delivery { key, delivered })
}

/// Record a keepalive from a device.
///
/// POST /api/gateway/keepalive/:device_id
pub async fn keepalive_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
) -> HandlerResult<Value> {
    state
        .directory
        .apply(&device_id, DeviceUpdate::Keepalive(chrono::Utc::now()))
        .await?;
    state.liveness.keepalive(&device_id);
    ok(serde_json::json!({ "deviceId": device_id, "online": true }))
}

/// Record that a device went offline.
///
/// POST /api/gateway/offline/:device_id
pub async fn offline_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
) -> HandlerResult<Value> {
    state
        .directory
        .apply(&device_id, DeviceUpdate::Online(false))
        .await?;
    state.liveness.mark_offline(&device_id);
    ok(serde_json::json!({ "deviceId": device_id, "online": false }))
}
