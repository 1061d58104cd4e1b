//! Page arithmetic for listings.

use serde::{Deserialize, Serialize};

/// A requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub per_page: u32,
}

impl Page {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Build a page from untrusted query values, clamping both to sane bounds.
    #[must_use]
    pub fn new(number: Option<u32>, per_page: u32) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// SQL `OFFSET` for this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.number.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// SQL `LIMIT` for this page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, 24)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: Page,
    pub total: i64,
}

impl<T> Paginated<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, page: Page, total: i64) -> Self {
        Self { items, page, total }
    }

    /// Number of pages; at least 1 so an empty listing still has a page.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let per_page = i64::from(self.page.per_page.max(1));
        let pages = (self.total.max(0) + per_page - 1) / per_page;
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page.number < self.total_pages()
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page.number > 1
    }

    /// Map the items, keeping page info.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(Page::new(Some(1), 20).offset(), 0);
        assert_eq!(Page::new(Some(3), 20).offset(), 40);
    }

    #[test]
    fn test_clamps_inputs() {
        let page = Page::new(Some(0), 1000);
        assert_eq!(page.number, 1);
        assert_eq!(page.per_page, Page::MAX_PER_PAGE);
        assert_eq!(Page::new(None, 0).per_page, 1);
    }

    #[test]
    fn test_total_pages_and_neighbours() {
        let p = Paginated::new(vec![1, 2], Page::new(Some(2), 10), 25);
        assert_eq!(p.total_pages(), 3);
        assert!(p.has_next());
        assert!(p.has_prev());

        let last = Paginated::new(vec![1], Page::new(Some(3), 10), 25);
        assert!(!last.has_next());
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let p: Paginated<i32> = Paginated::new(vec![], Page::default(), 0);
        assert_eq!(p.total_pages(), 1);
        assert!(!p.has_next());
        assert!(!p.has_prev());
    }
}
