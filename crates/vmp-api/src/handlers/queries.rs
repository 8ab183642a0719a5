//! Device query handlers.
//!
//! Each handler dispatches one command and holds the request open until the
//! command resolves. Failures map to 502 and timeouts to 504 so callers can
//! tell a rejecting device from a silent one.

use axum::extract::{Path, Query, State};
use serde::Serialize;
use serde_json::Value;
use vmp_commands::{AlarmQuery, CommandOutcome, DeviceCommand, ProtocolFailure, RegistryStats};
use vmp_devices::{Device, LivenessTracker};

use super::{
    ServerState,
    common::{HandlerResult, ok},
};
use crate::models::ErrorResponse;

/// Messages used to render a failed or silent command.
struct OutcomeText {
    failed: &'static str,
    timed_out: &'static str,
}

const CATALOG_TEXT: OutcomeText = OutcomeText {
    failed: "Channel sync failed",
    timed_out: "Channel sync timed out",
};

const STATUS_TEXT: OutcomeText = OutcomeText {
    failed: "Device status query failed",
    timed_out: "Timeout. Device did not respond to this command.",
};

const ALARM_TEXT: OutcomeText = OutcomeText {
    failed: "Alarm query failed",
    timed_out: "Alarm query timed out",
};

impl OutcomeText {
    fn failure(&self, failure: &ProtocolFailure) -> ErrorResponse {
        ErrorResponse::bad_gateway(format!(
            "{}, error code: {}, {}",
            self.failed, failure.code, failure.reason
        ))
    }

    /// Success payload, or the error the outcome maps to.
    fn render(&self, outcome: CommandOutcome) -> Result<Value, ErrorResponse> {
        match outcome {
            CommandOutcome::Success(payload) => Ok(payload),
            CommandOutcome::Failure(failure) => Err(self.failure(&failure)),
            CommandOutcome::TimedOut => Err(ErrorResponse::gateway_timeout(self.timed_out)),
        }
    }
}

/// Sync the channel catalog of a device and return the refreshed record.
///
/// POST /api/device/query/devices/:device_id/sync
pub async fn sync_catalog_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
) -> HandlerResult<Device> {
    tracing::debug!(category = "api", device_id = %device_id, "Channel sync API called");

    let outcome = state
        .dispatcher
        .dispatch(&device_id, DeviceCommand::Catalog)
        .await?;
    CATALOG_TEXT.render(outcome)?;

    let mut device = state
        .directory
        .get_device(&device_id)
        .await?
        .ok_or_else(|| ErrorResponse::not_found(format!("Device {}", device_id)))?;
    device.online = state.liveness.is_online(&device_id);
    ok(device)
}

/// Query the live status of a device.
///
/// GET /api/device/query/devices/:device_id/status
pub async fn device_status_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
) -> HandlerResult<Value> {
    tracing::debug!(category = "api", device_id = %device_id, "Device status API called");

    let outcome = state
        .dispatcher
        .dispatch(&device_id, DeviceCommand::DeviceStatus)
        .await?;
    ok(STATUS_TEXT.render(outcome)?)
}

/// Query alarms recorded by a device.
///
/// GET /api/device/query/alarm/:device_id?startPriority=&endPriority=&alarmMethod=&alarmType=&startTime=&endTime=
pub async fn alarm_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
    Query(query): Query<AlarmQuery>,
) -> HandlerResult<Value> {
    tracing::debug!(category = "api", device_id = %device_id, "Alarm query API called");

    let outcome = state
        .dispatcher
        .dispatch(&device_id, DeviceCommand::Alarm(query))
        .await?;
    ok(ALARM_TEXT.render(outcome)?)
}

/// In-flight command overview.
#[derive(Debug, Clone, Serialize)]
pub struct PendingOverview {
    #[serde(flatten)]
    pub registry: RegistryStats,
    /// Commands not yet taken by the gateway
    pub queued: usize,
}

/// GET /api/device/query/pending
pub async fn pending_handler(State(state): State<ServerState>) -> HandlerResult<PendingOverview> {
    ok(PendingOverview {
        registry: state.registry.stats(),
        queued: state.gateway.queued(),
    })
}
