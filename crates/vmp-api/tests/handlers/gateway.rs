//! Gateway handler tests.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::json;
use vmp_api::handlers::gateway::{
    FailureReport, NextCommandQuery, keepalive_handler, next_command_handler, offline_handler,
    push_handler, report_failure_handler,
};
use vmp_devices::LivenessTracker;

use crate::common::{DEVICE, create_test_server_state};

#[tokio::test(start_paused = true)]
async fn test_next_command_idle_returns_null() {
    let state = create_test_server_state().await;
    let response = next_command_handler(State(state), Query(NextCommandQuery { wait_ms: 50 }))
        .await
        .unwrap();
    assert!(response.0.data.flatten().is_none());
}

#[tokio::test]
async fn test_unmatched_push_is_not_an_error() {
    let state = create_test_server_state().await;
    let key = format!("status:{}", DEVICE);

    let response = push_handler(State(state.clone()), Path(key), Json(json!({})))
        .await
        .unwrap();
    assert!(!response.0.data.unwrap().delivered);
    assert_eq!(state.registry.stats().unmatched, 1);
}

#[tokio::test]
async fn test_bad_key_is_rejected() {
    let state = create_test_server_state().await;

    let err = push_handler(State(state.clone()), Path("reboot:x".into()), Json(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);

    let err = report_failure_handler(
        State(state),
        Path(format!("alarm:{}", DEVICE)),
        Json(FailureReport {
            code: 500,
            reason: "boom".into(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_keepalive_and_offline() {
    let state = create_test_server_state().await;

    let response = keepalive_handler(State(state.clone()), Path(DEVICE.to_string()))
        .await
        .unwrap();
    assert_eq!(response.0.data.unwrap()["online"], true);
    assert!(state.liveness.is_online(DEVICE));
    let stored = state.directory.get_device(DEVICE).await.unwrap().unwrap();
    assert!(stored.keepalive_time.is_some());

    let response = offline_handler(State(state.clone()), Path(DEVICE.to_string()))
        .await
        .unwrap();
    assert_eq!(response.0.data.unwrap()["online"], false);
    assert!(!state.liveness.is_online(DEVICE));

    let err = keepalive_handler(State(state), Path("nope".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}
