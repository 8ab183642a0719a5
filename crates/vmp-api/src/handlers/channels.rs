//! Channel handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use vmp_devices::{ChannelFilter, DeviceChannel, Page};

use super::{
    ServerState,
    common::{HandlerResult, PageQuery, ok, ok_with_meta},
};
use crate::models::PaginationMeta;

/// Query parameters for channel listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelListQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub count: Option<usize>,
    /// Substring of channel id or name
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    /// `false` for plain channels, `true` for sub-directories
    #[serde(default)]
    pub channel_type: Option<bool>,
}

impl ChannelListQuery {
    fn split(self) -> (PageQuery, ChannelFilter) {
        let defaults = PageQuery::default();
        let page = PageQuery {
            page: self.page.unwrap_or(defaults.page),
            count: self.count.unwrap_or(defaults.count),
        };
        let filter = ChannelFilter {
            query: self.query.filter(|q| !q.is_empty()),
            online: self.online,
            channel_type: self.channel_type,
        };
        (page, filter)
    }
}

/// List the channels of a device.
///
/// GET /api/device/query/devices/:device_id/channels
pub async fn list_channels_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
    Query(query): Query<ChannelListQuery>,
) -> HandlerResult<Vec<DeviceChannel>> {
    tracing::debug!(category = "api", device_id = %device_id, "List channels API called");
    let (page, filter) = query.split();
    let page = page.validate()?;

    let result = state
        .directory
        .list_channels(&device_id, &filter, page.page, page.count)
        .await?;
    let meta = PaginationMeta::from_page(&result);
    ok_with_meta(result.items, meta)
}

/// List the channels under a sub-directory channel. An unknown parent
/// yields an empty page.
///
/// GET /api/device/query/sub_channels/:device_id/:channel_id/channels
pub async fn list_sub_channels_handler(
    State(state): State<ServerState>,
    Path((device_id, channel_id)): Path<(String, String)>,
    Query(query): Query<ChannelListQuery>,
) -> HandlerResult<Vec<DeviceChannel>> {
    tracing::debug!(
        category = "api",
        device_id = %device_id,
        channel_id = %channel_id,
        "List sub-channels API called"
    );
    let (page, filter) = query.split();
    let page = page.validate()?;

    let result = match state.directory.get_channel(&device_id, &channel_id).await? {
        Some(_) => {
            state
                .directory
                .list_sub_channels(&device_id, &channel_id, &filter, page.page, page.count)
                .await?
        }
        None => Page::empty(page.page, page.count),
    };
    let meta = PaginationMeta::from_page(&result);
    ok_with_meta(result.items, meta)
}

/// Update the stored attributes of a channel.
///
/// POST /api/device/query/channel/update/:device_id
pub async fn update_channel_handler(
    State(state): State<ServerState>,
    Path(device_id): Path<String>,
    Json(channel): Json<DeviceChannel>,
) -> HandlerResult<DeviceChannel> {
    tracing::debug!(
        category = "api",
        device_id = %device_id,
        channel_id = %channel.channel_id,
        "Update channel API called"
    );
    let channel = state.directory.update_channel(&device_id, channel).await?;
    ok(channel)
}
