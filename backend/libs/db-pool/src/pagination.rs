//! Page/size validation shared by every paginated read

use error_types::{Result, ServiceError};
use serde::Deserialize;

/// Largest page a caller may request; bigger sizes are clamped.
pub const MAX_PAGE_SIZE: usize = 100;

/// Raw `?page=&limit=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Validate against endpoint defaults.
    pub fn resolve(&self, default_page: i64, default_limit: i64) -> Result<Pagination> {
        Pagination::new(
            self.page.unwrap_or(default_page),
            self.limit.unwrap_or(default_limit),
        )
    }
}

/// A validated 1-based page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Result<Self> {
        if page < 1 {
            return Err(ServiceError::Validation(format!(
                "page must be at least 1, got {page}"
            )));
        }
        if page_size < 1 {
            return Err(ServiceError::Validation(format!(
                "page size must be at least 1, got {page_size}"
            )));
        }

        let page_size = page_size.min(MAX_PAGE_SIZE as i64);
        let out_of_range = || ServiceError::Validation(format!("page {page} is out of range"));
        // Offsets are bound as BIGINT, so they must fit in i64 as well as usize
        let offset = (page - 1).checked_mul(page_size).ok_or_else(out_of_range)?;
        usize::try_from(offset).map_err(|_| out_of_range())?;

        Ok(Self {
            page: usize::try_from(page).map_err(|_| out_of_range())?,
            page_size: page_size as usize,
        })
    }

    /// Number of items before this page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Slice out this page from an already ordered sequence.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(
            Pagination::new(0, 10),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            Pagination::new(1, 0),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_pages_past_the_addressable_range() {
        assert!(matches!(
            Pagination::new(i64::MAX, 20),
            Err(ServiceError::Validation(_))
        ));

        let last = i64::MAX / 20 + 1;
        let page = Pagination::new(last, 20).unwrap();
        assert!(i64::try_from(page.offset()).is_ok());
    }

    #[test]
    fn test_clamps_page_size() {
        let page = Pagination::new(2, 1_000).unwrap();
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
        assert_eq!(page.offset(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_slice_pages_cover_everything_once() {
        let items: Vec<u32> = (0..7).collect();
        let mut seen = Vec::new();
        for page in 1..=4 {
            seen.extend_from_slice(Pagination::new(page, 3).unwrap().slice(&items));
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn test_query_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.resolve(1, 3).unwrap(), Pagination::new(1, 3).unwrap());

        let query = PageQuery {
            page: Some(-1),
            limit: None,
        };
        assert!(query.resolve(1, 3).is_err());
    }
}
