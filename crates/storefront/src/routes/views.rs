//! View models shared by several pages.

use solera_core::CurrencyCode;
use solera_core::pagination::Paginated;
use solera_db::models::{Collection, ProductSummary};

use crate::filters;

/// Product listing card.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub name: String,
    pub url: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub in_stock: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(summary: &ProductSummary, currency: CurrencyCode) -> Self {
        Self {
            name: summary.name.clone(),
            url: summary.url(),
            price: filters::price(summary.base_price, currency),
            compare_at_price: summary
                .compare_at_price
                .filter(|compare| *compare > summary.base_price)
                .map(|compare| filters::price(compare, currency)),
            image_url: summary.image_url.clone(),
            category: summary.category_name.clone(),
            in_stock: summary.in_stock(),
        }
    }

    #[must_use]
    pub fn list(summaries: &[ProductSummary], currency: CurrencyCode) -> Vec<Self> {
        summaries.iter().map(|s| Self::new(s, currency)).collect()
    }
}

/// Collection tile.
#[derive(Debug, Clone)]
pub struct CollectionTile {
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
}

impl From<&Collection> for CollectionTile {
    fn from(collection: &Collection) -> Self {
        Self {
            name: collection.name.clone(),
            url: format!("/collections/{}", collection.slug),
            image_url: collection.image_url.clone(),
        }
    }
}

/// Previous/next links for a paginated listing.
#[derive(Debug, Clone)]
pub struct PageLinks {
    pub current: u32,
    pub total_pages: u32,
    pub total: i64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl PageLinks {
    /// Links for `paginated`, appending `page=N` to `base_query` (which must
    /// not already contain a page parameter).
    #[must_use]
    pub fn new<T>(paginated: &Paginated<T>, path: &str, base_query: &str) -> Self {
        let link = |page: u32| {
            if base_query.is_empty() {
                format!("{path}?page={page}")
            } else {
                format!("{path}?{base_query}&page={page}")
            }
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
    fn test_page_links_keep_query() {
        let paginated = Paginated::new(vec![(); 24], Page::new(Some(2), 24), 60);
        let links = PageLinks::new(&paginated, "/shop", "size=38&sort=name");
        assert_eq!(links.total_pages, 3);
        assert_eq!(links.prev_url.as_deref(), Some("/shop?size=38&sort=name&page=1"));
        assert_eq!(links.next_url.as_deref(), Some("/shop?size=38&sort=name&page=3"));
    }

    #[test]
    fn test_single_page_has_no_links() {
        let paginated = Paginated::new(vec![(); 3], Page::default(), 3);
        let links = PageLinks::new(&paginated, "/shop", "");
        assert!(!links.is_multi_page());
        assert!(links.prev_url.is_none());
        assert!(links.next_url.is_none());
    }
}
