//! Query handler tests on a paused clock. A spawned task plays the
//! signaling gateway through the gateway handlers.

use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::json;
use tokio::time::Instant;
use vmp_api::ServerState;
use vmp_api::handlers::gateway::{
    FailureReport, NextCommandQuery, next_command_handler, push_handler, report_failure_handler,
};
use vmp_api::handlers::queries::{
    alarm_handler, device_status_handler, pending_handler, sync_catalog_handler,
};
use vmp_commands::{AlarmQuery, CommandKind, OutboundCommand};

use crate::common::{DEVICE, create_test_server_state};

async fn take_command(state: &ServerState) -> OutboundCommand {
    let response = next_command_handler(
        State(state.clone()),
        Query(NextCommandQuery { wait_ms: 1_000 }),
    )
    .await
    .unwrap();
    response.0.data.flatten().unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_status_failure_maps_to_bad_gateway() {
    let state = create_test_server_state().await;

    let gateway = state.clone();
    tokio::spawn(async move {
        let command = take_command(&gateway).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        let response = report_failure_handler(
            State(gateway),
            Path(command.key.to_string()),
            Json(FailureReport {
                code: 404,
                reason: "not found".into(),
            }),
        )
        .await
        .unwrap();
        assert!(response.0.data.unwrap().delivered);
    });

    let start = Instant::now();
    let err = device_status_handler(State(state.clone()), Path(DEVICE.to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        err.message,
        "Device status query failed, error code: 404, not found"
    );
    assert_eq!(start.elapsed(), Duration::from_millis(500));
    assert!(state.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sync_timeout_maps_to_gateway_timeout() {
    let state = create_test_server_state().await;
    let start = Instant::now();

    let err = sync_catalog_handler(State(state.clone()), Path(DEVICE.to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(err.message, "Channel sync timed out");
    assert!(start.elapsed() >= Duration::from_millis(2000));
    assert!(start.elapsed() < Duration::from_millis(2100));
}

#[tokio::test(start_paused = true)]
async fn test_sync_failure_message() {
    let state = create_test_server_state().await;

    let gateway = state.clone();
    tokio::spawn(async move {
        let command = take_command(&gateway).await;
        assert_eq!(command.kind, CommandKind::Catalog);
        gateway.gateway.report_failure(&command.key, 408, "Request Timeout");
    });

    let err = sync_catalog_handler(State(state), Path(DEVICE.to_string()))
        .await
        .unwrap_err();
    assert_eq!(
        err.message,
        "Channel sync failed, error code: 408, Request Timeout"
    );
}

#[tokio::test(start_paused = true)]
async fn test_sync_success_returns_refreshed_device() {
    let state = create_test_server_state().await;

    let gateway = state.clone();
    tokio::spawn(async move {
        let command = take_command(&gateway).await;
        let catalog = json!({"channels": [
            {"channelId": "34020000001310000009", "name": "Roof"}
        ]});
        let delivery = push_handler(State(gateway), Path(command.key.to_string()), Json(catalog))
            .await
            .unwrap();
        assert!(delivery.0.data.unwrap().delivered);
    });

    let response = sync_catalog_handler(State(state), Path(DEVICE.to_string()))
        .await
        .unwrap();
    assert_eq!(response.0.data.unwrap().channel_count, 5);
}

#[tokio::test(start_paused = true)]
async fn test_alarm_query_forwards_filters_and_returns_payload() {
    let state = create_test_server_state().await;

    let gateway = state.clone();
    tokio::spawn(async move {
        let command = take_command(&gateway).await;
        assert_eq!(command.params["startPriority"], "1");
        assert_eq!(command.params["endPriority"], "3");
        tokio::time::sleep(Duration::from_millis(1200)).await;
        let response = push_handler(
            State(gateway),
            Path(command.key.to_string()),
            Json(json!({"alarms": []})),
        )
        .await
        .unwrap();
        assert!(response.0.data.unwrap().delivered);
    });

    let start = Instant::now();
    let query = AlarmQuery {
        start_priority: Some("1".into()),
        end_priority: Some("3".into()),
        ..Default::default()
    };
    let response = alarm_handler(State(state), Path(DEVICE.to_string()), Query(query))
        .await
        .unwrap();
    assert_eq!(response.0.data.unwrap(), json!({"alarms": []}));
    assert_eq!(start.elapsed(), Duration::from_millis(1200));
}

#[tokio::test]
async fn test_query_unknown_device_is_not_found() {
    let state = create_test_server_state().await;

    let err = device_status_handler(State(state.clone()), Path("nope".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);

    let pending = pending_handler(State(state)).await.unwrap();
    let overview = pending.0.data.unwrap();
    assert_eq!(overview.registry.registered, 0);
    assert_eq!(overview.queued, 0);
}
