//! Basic handlers - health check.

use axum::{Json, extract::State};
use serde::Serialize;

use super::ServerState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: &'static str,
    pub uptime: u64,
    pub in_flight: usize,
}

/// Health check with uptime and in-flight command count.
///
/// GET /api/health
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthStatus> {
    let uptime = chrono::Utc::now().timestamp() - state.started_at;

    Json(HealthStatus {
        status: "healthy".to_string(),
        service: "vmp-device-query".to_string(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: uptime.max(0) as u64,
        in_flight: state.registry.len(),
    })
}
