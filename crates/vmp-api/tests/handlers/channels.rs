//! Channel handler tests.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use vmp_api::handlers::channels::{
    ChannelListQuery, list_channels_handler, list_sub_channels_handler, update_channel_handler,
};
use vmp_devices::DeviceChannel;

use crate::common::{DEVICE, FOLDER, create_test_server_state};

#[tokio::test]
async fn test_list_channels_with_filters() {
    let state = create_test_server_state().await;

    let all = list_channels_handler(
        State(state.clone()),
        Path(DEVICE.to_string()),
        Query(ChannelListQuery::default()),
    )
    .await
    .unwrap();
    assert_eq!(all.0.data.unwrap().len(), 4);

    let online = list_channels_handler(
        State(state.clone()),
        Path(DEVICE.to_string()),
        Query(ChannelListQuery {
            online: Some(true),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(online.0.data.unwrap().len(), 2);

    let folders = list_channels_handler(
        State(state),
        Path(DEVICE.to_string()),
        Query(ChannelListQuery {
            channel_type: Some(true),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let folders = folders.0.data.unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].channel_id, FOLDER);
}

#[tokio::test]
async fn test_sub_channels() {
    let state = create_test_server_state().await;

    let response = list_sub_channels_handler(
        State(state),
        Path((DEVICE.to_string(), FOLDER.to_string())),
        Query(ChannelListQuery::default()),
    )
    .await
    .unwrap();
    let body = response.0;
    assert_eq!(body.data.unwrap()[0].channel_id, "34020000001310000003");
    assert_eq!(body.meta.unwrap().pagination.unwrap().total_count, 1);
}

#[tokio::test]
async fn test_sub_channels_of_missing_parent_is_empty() {
    let state = create_test_server_state().await;

    let response = list_sub_channels_handler(
        State(state),
        Path((DEVICE.to_string(), "34020000002160009999".to_string())),
        Query(ChannelListQuery {
            page: Some(1),
            count: Some(10),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let body = response.0;
    assert!(body.data.unwrap().is_empty());
    assert_eq!(body.meta.unwrap().pagination.unwrap().total_count, 0);
}

#[tokio::test]
async fn test_update_channel() {
    let state = create_test_server_state().await;

    let renamed = DeviceChannel::new("", "34020000001310000002").with_name("Loading dock");
    let response = update_channel_handler(
        State(state.clone()),
        Path(DEVICE.to_string()),
        Json(renamed),
    )
    .await
    .unwrap();
    assert_eq!(response.0.data.unwrap().device_id, DEVICE);

    let stored = state
        .directory
        .get_channel(DEVICE, "34020000001310000002")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name.as_deref(), Some("Loading dock"));

    let err = update_channel_handler(
        State(state),
        Path("nope".to_string()),
        Json(DeviceChannel::new("", "x")),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}
