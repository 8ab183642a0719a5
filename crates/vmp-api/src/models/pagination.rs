//! Pagination support for list endpoints.

use serde::{Deserialize, Serialize};
use vmp_devices::Page;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Maximum page size.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: usize,
    /// Number of items per page.
    pub page_size: usize,
    /// Total number of items across all pages.
    pub total_count: usize,
    /// Total number of pages.
    pub total_pages: usize,
    /// Whether there is a next page.
    pub has_next: bool,
    /// Whether there is a previous page.
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, page_size: usize, total_count: usize) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(page_size)
        };
        Self {
            page,
            page_size,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    pub fn from_page<T>(page: &Page<T>) -> Self {
        Self::new(page.page, page.count, page.total)
    }
}
