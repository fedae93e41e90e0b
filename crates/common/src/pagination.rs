//! Pagination utilities shared by the service and HTTP layers
//!
//! `Pagination` normalizes query inputs; `Page` is the response envelope.

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u32,
    /// items per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 { 1 }
fn default_page_size() -> u32 { 20 }

impl Pagination {
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Clamp to sane defaults; page becomes 0-based, both as `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.page_size.clamp(1, Self::MAX_PAGE_SIZE);
        ((page - 1) as u64, per_page as u64)
    }

    /// Normalized copy, used as a stable cache key
    pub fn normalized(self) -> Self {
        let (idx, per) = self.normalize();
        Self { page: idx as u32 + 1, page_size: per as u32 }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: default_page(), page_size: default_page_size() } }
}

/// Paginated response envelope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(count: u64, opts: Pagination, results: Vec<T>) -> Self {
        let opts = opts.normalized();
        Self { count, page: opts.page, page_size: opts.page_size, results }
    }
}
