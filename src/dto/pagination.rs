use serde::Serialize;

use crate::repository::Page;

pub const DEFAULT_LIMIT: u64 = 20;
pub const ADMIN_DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: Page, total: u64) -> Self {
        Pagination {
            page: page.page,
            limit: page.limit,
            total,
            pages: total.div_ceil(page.limit.max(1)),
        }
    }
}

/// Resolves optional `page`/`limit` query values; validation has already
/// bounded them, the clamp only guards direct callers.
pub fn page_of(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Page {
    Page::new(page.unwrap_or(1), limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_is_ceiling_of_total_over_limit() {
        assert_eq!(Pagination::new(Page::new(1, 20), 0).pages, 0);
        assert_eq!(Pagination::new(Page::new(1, 20), 20).pages, 1);
        assert_eq!(Pagination::new(Page::new(2, 20), 21).pages, 2);
        assert_eq!(Pagination::new(Page::new(1, 7), 50).pages, 8);
    }

    #[test]
    fn test_page_defaults() {
        assert_eq!(page_of(None, None, DEFAULT_LIMIT), Page::new(1, 20));
        assert_eq!(page_of(Some(3), Some(500), DEFAULT_LIMIT), Page::new(3, 100));
        assert_eq!(page_of(None, None, ADMIN_DEFAULT_LIMIT).limit, 50);
    }
}
