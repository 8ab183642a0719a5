//! Unified error handling for the API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use vmp_commands::{DispatchError, KeyParseError};
use vmp_devices::DirectoryError;

/// Unified API error response with proper HTTP status codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    #[serde(skip)]
    pub status: StatusCode,
    /// Optional request ID for tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
            request_id: None,
        }
    }

    /// Set the request ID.
    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Bad request (400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
    }

    /// Not found (404).
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            "NOT_FOUND",
            format!("{} not found", resource.into()),
            StatusCode::NOT_FOUND,
        )
    }

    /// Not acceptable (406). The request is understood but refused in the
    /// resource's current state.
    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::new("NOT_ACCEPTABLE", message, StatusCode::NOT_ACCEPTABLE)
    }

    /// Validation error (422).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            "VALIDATION_ERROR",
            message,
            StatusCode::UNPROCESSABLE_ENTITY,
        )
    }

    /// Internal server error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Bad gateway (502). The device or transport rejected the command.
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("DEVICE_COMMAND_FAILED", message, StatusCode::BAD_GATEWAY)
    }

    /// Service unavailable (503).
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            "SERVICE_UNAVAILABLE",
            message,
            StatusCode::SERVICE_UNAVAILABLE,
        )
    }

    /// Gateway timeout (504). The device never answered.
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new("DEVICE_TIMEOUT", message, StatusCode::GATEWAY_TIMEOUT)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": self.code,
                "message": self.message,
                "request_id": self.request_id,
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

impl From<DirectoryError> for ErrorResponse {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::DeviceNotFound(id) => Self::not_found(format!("Device {}", id)),
            DirectoryError::ChannelNotFound {
                device_id,
                channel_id,
            } => Self::not_found(format!("Channel {}/{}", device_id, channel_id)),
            DirectoryError::Storage(msg) => Self::internal(format!("Directory error: {}", msg)),
        }
    }
}

impl From<DispatchError> for ErrorResponse {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::DeviceNotFound(id) => Self::not_found(format!("Device {}", id)),
            DispatchError::Directory(e) => e.into(),
        }
    }
}

impl From<KeyParseError> for ErrorResponse {
    fn from(e: KeyParseError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<vmp_core::Error> for ErrorResponse {
    fn from(e: vmp_core::Error) -> Self {
        match e {
            vmp_core::Error::NotFound(what) => Self::not_found(what),
            vmp_core::Error::Validation(msg) => Self::validation(msg),
            other => Self::internal(other.to_string()),
        }
    }
}
