//! Device handler tests.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use vmp_api::handlers::common::PageQuery;
use vmp_api::handlers::devices::{
    delete_device_handler, get_device_handler, list_devices_handler, update_transport_handler,
};
use vmp_devices::StreamMode;

use crate::common::{DEVICE, OTHER_DEVICE, create_test_server_state};

#[tokio::test]
async fn test_get_device() {
    let state = create_test_server_state().await;
    let response = get_device_handler(State(state), Path(DEVICE.to_string()))
        .await
        .unwrap();
    let device = response.0.data.unwrap();
    assert_eq!(device.device_id, DEVICE);
    assert_eq!(device.channel_count, 4);
    assert!(!device.online);
}

#[tokio::test]
async fn test_get_device_reflects_liveness() {
    let state = create_test_server_state().await;
    state.liveness.keepalive(DEVICE);
    let response = get_device_handler(State(state), Path(DEVICE.to_string()))
        .await
        .unwrap();
    assert!(response.0.data.unwrap().online);
}

#[tokio::test]
async fn test_get_unknown_device() {
    let state = create_test_server_state().await;
    let err = get_device_handler(State(state), Path("nope".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_devices_paginated() {
    let state = create_test_server_state().await;
    let response = list_devices_handler(State(state), Query(PageQuery { page: 1, count: 1 }))
        .await
        .unwrap();

    let body = response.0;
    assert_eq!(body.data.unwrap().len(), 1);
    let pagination = body.meta.unwrap().pagination.unwrap();
    assert_eq!(pagination.total_count, 2);
    assert_eq!(pagination.total_pages, 2);
    assert!(pagination.has_next);
}

#[tokio::test]
async fn test_list_devices_reflects_liveness() {
    let state = create_test_server_state().await;
    state.liveness.keepalive(DEVICE);
    let response = list_devices_handler(State(state), Query(PageQuery::default()))
        .await
        .unwrap();

    let devices = response.0.data.unwrap();
    assert_eq!(devices.len(), 2);
    for device in devices {
        assert_eq!(device.online, device.device_id == DEVICE);
    }
}

#[tokio::test]
async fn test_delete_online_device_refused() {
    let state = create_test_server_state().await;
    state.liveness.keepalive(DEVICE);

    let err = delete_device_handler(State(state.clone()), Path(DEVICE.to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_ACCEPTABLE);
    assert!(state.directory.get_device(DEVICE).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_offline_device() {
    let state = create_test_server_state().await;

    let response = delete_device_handler(State(state.clone()), Path(OTHER_DEVICE.to_string()))
        .await
        .unwrap();
    assert_eq!(response.0.data.unwrap()["deviceId"], OTHER_DEVICE);

    let err = delete_device_handler(State(state), Path(OTHER_DEVICE.to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_transport() {
    let state = create_test_server_state().await;

    let response = update_transport_handler(
        State(state.clone()),
        Path((DEVICE.to_string(), "TCP-PASSIVE".to_string())),
    )
    .await
    .unwrap();
    assert_eq!(response.0.data.unwrap().stream_mode, StreamMode::TcpPassive);

    let err = update_transport_handler(
        State(state.clone()),
        Path((DEVICE.to_string(), "TCP-ACTIVE".to_string())),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

    let err = update_transport_handler(
        State(state.clone()),
        Path((DEVICE.to_string(), "QUIC".to_string())),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);

    let err = update_transport_handler(
        State(state),
        Path(("nope".to_string(), "UDP".to_string())),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}
