//! Common API handler utilities.

use axum::response::Json;
use serde::Deserialize;

use crate::models::{
    common::ApiResponse,
    error::ErrorResponse,
    pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PaginationMeta},
};

/// Unified Result type for all API handlers.
pub type HandlerResult<T> = Result<Json<ApiResponse<T>>, ErrorResponse>;

/// Result type for utility functions that return parsed values.
pub type ExtractResult<T> = Result<T, ErrorResponse>;

/// `page`/`count` query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: usize,

    /// Items per page.
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_page() -> usize {
    1
}

fn default_count() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            count: default_count(),
        }
    }
}

impl PageQuery {
    /// Validate and clamp the pagination parameters.
    pub fn validate(mut self) -> ExtractResult<Self> {
        if self.page == 0 {
            self.page = 1;
        }
        if self.count == 0 {
            return Err(ErrorResponse::bad_request("count must be greater than 0"));
        }
        if self.count > MAX_PAGE_SIZE {
            return Err(ErrorResponse::bad_request(format!(
                "count cannot exceed {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(self)
    }
}

/// Create a successful response with data.
pub fn ok<T: serde::Serialize>(data: T) -> HandlerResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Create a successful response with data and pagination metadata.
pub fn ok_with_meta<T: serde::Serialize>(data: T, meta: PaginationMeta) -> HandlerResult<T> {
    Ok(Json(ApiResponse::paginated(data, meta)))
}
