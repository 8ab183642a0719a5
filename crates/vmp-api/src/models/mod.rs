//! API data models.

pub mod common;
pub mod error;
pub mod pagination;

pub use common::{ApiError, ApiResponse, ResponseMeta};
pub use error::ErrorResponse;
pub use pagination::PaginationMeta;
