//! Previous/next links for paginated admin tables.

use solera_core::pagination::Paginated;

/// Listing page size for admin tables.
pub const PER_PAGE: u32 = 25;

/// Links for a paginated table.
#[derive(Debug, Clone)]
pub struct PageLinks {
    pub current: u32,
    pub total_pages: u32,
    pub total: i64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl PageLinks {
    /// Links for `paginated`. `params` are the other query parameters to
    /// keep; empty values are dropped.
    #[must_use]
    pub fn new<T>(paginated: &Paginated<T>, path: &str, params: &[(&str, &str)]) -> Self {
        let base: Vec<String> = params
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect();
        let link = |page: u32| {
            let mut query = base.clone();
            query.push(format!("page={page}"));
            format!("{path}?{}", query.join("&"))
        };

        let current = paginated.page.number;
        Self {
            current,
            total_pages: paginated.total_pages(),
            total: paginated.total,
            prev_url: paginated.has_prev().then(|| link(current - 1)),
            next_url: paginated.has_next().then(|| link(current + 1)),
        }
    }

    #[must_use]
    pub const fn is_multi_page(&self) -> bool {
        self.total_pages > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solera_core::pagination::Page;

    #[test]
    fn test_links_keep_filters_and_drop_blanks() {
        let paginated = Paginated::new(vec![(); 25], Page::new(Some(2), PER_PAGE), 80);
        let links = PageLinks::new(&paginated, "/orders", &[("status", "SHIPPED"), ("q", "")]);
        assert_eq!(links.total_pages, 4);
        assert_eq!(links.prev_url.as_deref(), Some("/orders?status=SHIPPED&page=1"));
        assert_eq!(links.next_url.as_deref(), Some("/orders?status=SHIPPED&page=3"));
    }

    #[test]
    fn test_search_terms_are_encoded() {
        let paginated = Paginated::new(vec![(); 25], Page::new(Some(1), PER_PAGE), 30);
        let links = PageLinks::new(&paginated, "/products", &[("q", "deri sandalet")]);
        assert_eq!(links.next_url.as_deref(), Some("/products?q=deri%20sandalet&page=2"));
        assert!(links.prev_url.is_none());
    }

    #[test]
    fn test_empty_listing_is_one_page() {
        let paginated = Paginated::new(Vec::<()>::new(), Page::new(None, PER_PAGE), 0);
        let links = PageLinks::new(&paginated, "/orders", &[]);
        assert_eq!(links.total_pages, 1);
        assert!(!links.is_multi_page());
    }
}
