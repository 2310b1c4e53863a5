//! Page/limit handling shared by every list endpoint

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// A clamped page request: `page >= 1`, `1 <= limit <= MAX_LIMIT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination block returned next to every listed collection
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct Pagination {
    /// Total number of matching rows
    pub total: i64,
    /// Current page number (1-based)
    pub page: i64,
    /// Rows per page
    pub limit: i64,
    /// Number of pages for this limit
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            total_pages: (total + request.limit - 1) / request.limit,
        }
    }

    /// Slice an already fully loaded list
    pub fn slice<T: Clone>(request: PageRequest, rows: &[T]) -> Vec<T> {
        rows.iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_page_and_limit() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(-3), Some(500)), PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(Some(4), Some(25)), PageRequest { page: 4, limit: 25 });
    }

    #[test]
    fn test_second_page_of_twenty_five() {
        let request = PageRequest::new(Some(2), Some(10));
        assert_eq!(request.offset(), 10);

        let pagination = Pagination::new(request, 25);
        assert_eq!(pagination.total, 25);
        assert_eq!(pagination.total_pages, 3);

        let rows: Vec<i32> = (1..=25).collect();
        assert_eq!(Pagination::slice(request, &rows), (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        let pagination = Pagination::new(PageRequest::default(), 0);
        assert_eq!(pagination.total_pages, 0);

        let rows: Vec<i32> = vec![1, 2, 3];
        assert!(Pagination::slice(PageRequest::new(Some(5), None), &rows).is_empty());
    }
}
