//! Application router configuration.

use axum::{
    Router,
    routing::{delete, get, post},
};

use super::state::ServerState;
use crate::handlers::{basic, channels, devices, gateway, queries};

/// Create the application router with a specific state.
pub fn create_router(state: ServerState, max_body_bytes: usize) -> Router {
    let query_routes = Router::new()
        .route("/devices", get(devices::list_devices_handler))
        .route("/devices/:device_id", get(devices::get_device_handler))
        .route(
            "/devices/:device_id/delete",
            delete(devices::delete_device_handler),
        )
        .route(
            "/devices/:device_id/channels",
            get(channels::list_channels_handler),
        )
        .route(
            "/sub_channels/:device_id/:channel_id/channels",
            get(channels::list_sub_channels_handler),
        )
        .route(
            "/channel/update/:device_id",
            post(channels::update_channel_handler),
        )
        .route(
            "/transport/:device_id/:stream_mode",
            post(devices::update_transport_handler),
        )
        .route("/devices/:device_id/sync", post(queries::sync_catalog_handler))
        .route(
            "/devices/:device_id/status",
            get(queries::device_status_handler),
        )
        .route("/alarm/:device_id", get(queries::alarm_handler))
        .route("/pending", get(queries::pending_handler));

    let gateway_routes = Router::new()
        .route("/commands/next", get(gateway::next_command_handler))
        .route(
            "/commands/:key/failure",
            post(gateway::report_failure_handler),
        )
        .route("/push/:key", post(gateway::push_handler))
        .route("/keepalive/:device_id", post(gateway::keepalive_handler))
        .route("/offline/:device_id", post(gateway::offline_handler));

    Router::new()
        .route("/api/health", get(basic::health_handler))
        .nest("/api/device/query", query_routes)
        .nest("/api/gateway", gateway_routes)
        .layer(tower_http::limit::RequestBodyLimitLayer::new(max_body_bytes))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
