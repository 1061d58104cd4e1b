//! Product listing and detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, RawQuery, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use solera_core::catalog::{VariantMatrix, VariantOption};
use solera_core::pagination::Page;
use solera_core::{CurrencyCode, Gender};
use solera_db::models::{Category, ProductDetail, ProductFilter, ProductSort};
use solera_db::{CategoryRepository, ProductRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::page::PageContext;
use crate::routes::views::{PageLinks, ProductCard};
use crate::services::markdown;
use crate::state::AppState;

/// Products per listing page.
const PER_PAGE: u32 = 24;

/// Related products shown under a product.
const RELATED_LIMIT: i64 = 4;

// =============================================================================
// Listing query
// =============================================================================

/// Listing filters as they appear in the query string.
///
/// `size` and `color` may repeat (`?size=38&size=39`), which `Query` cannot
/// collect, so the raw query is parsed by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: bool,
    pub q: Option<String>,
    pub sort: ProductSort,
    pub page: Option<u32>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ListingQuery {
    /// Parse a raw query string. Unknown keys and malformed values are ignored.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "category" => query.category = non_empty(&value),
                "size" => {
                    if let Some(size) = non_empty(&value)
                        && !query.sizes.contains(&size)
                    {
                        query.sizes.push(size);
                    }
                }
                "color" => {
                    if let Some(color) = non_empty(&value)
                        && !query.colors.contains(&color)
                    {
                        query.colors.push(color);
                    }
                }
                "min_price" => query.min_price = value.trim().parse().ok(),
                "max_price" => query.max_price = value.trim().parse().ok(),
                "in_stock" => query.in_stock = matches!(value.as_ref(), "1" | "true" | "on"),
                "q" => query.q = non_empty(&value),
                "sort" => query.sort = value.parse().unwrap_or_default(),
                "page" => query.page = value.parse().ok(),
                _ => {}
            }
        }

        query
    }

    /// Repository filter for this query.
    #[must_use]
    pub fn to_filter(&self, gender: Option<Gender>) -> ProductFilter {
        ProductFilter {
            gender,
            category: self.category.clone(),
            collection: None,
            sizes: self.sizes.clone(),
            colors: self.colors.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock_only: self.in_stock,
            q: self.q.clone(),
            sort: self.sort,
        }
    }

    /// The query re-encoded without the page number, for pagination links.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        if let Some(category) = &self.category {
            out.append_pair("category", category);
        }
        for size in &self.sizes {
            out.append_pair("size", size);
        }
        for color in &self.colors {
            out.append_pair("color", color);
        }
        if let Some(min) = self.min_price {
            out.append_pair("min_price", &min.to_string());
        }
        if let Some(max) = self.max_price {
            out.append_pair("max_price", &max.to_string());
        }
        if self.in_stock {
            out.append_pair("in_stock", "1");
        }
        if let Some(q) = &self.q {
            out.append_pair("q", q);
        }
        if self.sort != ProductSort::default() {
            out.append_pair("sort", self.sort.as_str());
        }
        out.finish()
    }
}

// =============================================================================
// Listing views
// =============================================================================

/// A checkbox or select option in the filter sidebar.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Gender navigation tab.
#[derive(Debug, Clone)]
pub struct GenderTab {
    pub label: &'static str,
    pub url: String,
    pub active: bool,
}

fn gender_tabs(current: Option<Gender>) -> Vec<GenderTab> {
    std::iter::once(GenderTab {
        label: "All",
        url: "/shop".to_string(),
        active: current.is_none(),
    })
    .chain(Gender::ALL.into_iter().map(|g| GenderTab {
        label: g.label(),
        url: format!("/shop/{}", g.as_str()),
        active: current == Some(g),
    }))
    .collect()
}

fn options(values: &[String], selected: &[String]) -> Vec<FilterOption> {
    values
        .iter()
        .map(|v| FilterOption {
            value: v.clone(),
            label: v.clone(),
            selected: selected.contains(v),
        })
        .collect()
}

fn category_options(categories: &[Category], selected: Option<&str>) -> Vec<FilterOption> {
    categories
        .iter()
        .map(|c| FilterOption {
            value: c.slug.clone(),
            label: c.name.clone(),
            selected: selected == Some(c.slug.as_str()),
        })
        .collect()
}

fn sort_options(current: ProductSort) -> Vec<FilterOption> {
    ProductSort::ALL
        .into_iter()
        .map(|s| FilterOption {
            value: s.as_str().to_string(),
            label: s.label().to_string(),
            selected: s == current,
        })
        .collect()
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductIndexTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub action: String,
    pub tabs: Vec<GenderTab>,
    pub products: Vec<ProductCard>,
    pub pagination: PageLinks,
    pub categories: Vec<FilterOption>,
    pub sizes: Vec<FilterOption>,
    pub colors: Vec<FilterOption>,
    pub sorts: Vec<FilterOption>,
    pub min_price: String,
    pub max_price: String,
    pub in_stock: bool,
    pub q: String,
}

/// All products.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    listing(&state, ctx, None, raw.as_deref()).await
}

/// Products of one gender line.
#[instrument(skip(state, ctx))]
pub async fn by_gender(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(gender): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse> {
    let gender: Gender = gender
        .parse()
        .map_err(|_| AppError::NotFound(format!("No products for '{gender}'")))?;
    listing(&state, ctx, Some(gender), raw.as_deref()).await
}

async fn listing(
    state: &AppState,
    ctx: PageContext,
    gender: Option<Gender>,
    raw: Option<&str>,
) -> Result<ProductIndexTemplate> {
    let query = ListingQuery::parse(raw);
    let filter = query.to_filter(gender);
    let products = ProductRepository::new(state.pool());
    let category_repo = CategoryRepository::new(state.pool());

    let (results, facets, categories) = tokio::try_join!(
        products.search(&filter, Page::new(query.page, PER_PAGE)),
        products.facets(gender),
        category_repo.list(),
    )?;

    let action = gender.map_or_else(|| "/shop".to_string(), |g| format!("/shop/{}", g.as_str()));
    let currency = ctx.settings.currency;

    Ok(ProductIndexTemplate {
        heading: gender.map_or("All sandals", Gender::label).to_string(),
        tabs: gender_tabs(gender),
        products: ProductCard::list(&results.items, currency),
        pagination: PageLinks::new(&results, &action, &query.to_query_string()),
        categories: category_options(&categories, query.category.as_deref()),
        sizes: options(&facets.sizes, &query.sizes),
        colors: options(&facets.colors, &query.colors),
        sorts: sort_options(query.sort),
        min_price: query.min_price.map(|p| p.to_string()).unwrap_or_default(),
        max_price: query.max_price.map(|p| p.to_string()).unwrap_or_default(),
        in_stock: query.in_stock,
        q: query.q.clone().unwrap_or_default(),
        action,
        ctx,
    })
}

// =============================================================================
// Product detail
// =============================================================================

/// Variant picked through `?color=&size=`.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub color: Option<String>,
    pub size: Option<String>,
}

/// The resolved color/size selection on a product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    pub color: Option<&'a str>,
    pub size: Option<&'a str>,
    pub variant: Option<&'a VariantOption>,
}

/// Resolve a requested color/size against the matrix.
///
/// An unknown color falls back to the default selection's color. An unknown
/// size, or one missing for the color, falls back to the first size in stock
/// for that color.
#[must_use]
pub fn resolve_selection<'a>(
    matrix: &'a VariantMatrix,
    color: Option<&str>,
    size: Option<&str>,
) -> Selection<'a> {
    let colors = matrix.colors();
    let color = color
        .and_then(|c| colors.iter().copied().find(|known| *known == c))
        .or_else(|| matrix.default_selection().map(|v| v.color.as_str()));

    let Some(color) = color else {
        return Selection {
            color: None,
            size: None,
            variant: None,
        };
    };

    let variant = size
        .and_then(|s| matrix.find(color, s))
        .or_else(|| {
            matrix
                .sizes_in_stock(color)
                .first()
                .and_then(|s| matrix.find(color, s))
        });

    Selection {
        color: Some(color),
        size: variant.map(|v| v.size.as_str()),
        variant,
    }
}

/// Color swatch.
#[derive(Debug, Clone)]
pub struct ColorOption {
    pub name: String,
    pub hex: String,
    pub url: String,
    pub selected: bool,
}

/// Size button; out-of-stock sizes render disabled.
#[derive(Debug, Clone)]
pub struct SizeOption {
    pub size: String,
    pub url: String,
    pub selected: bool,
    pub available: bool,
}

/// Product image.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub name: String,
    pub url: String,
    pub gender_label: &'static str,
    pub gender_url: String,
    pub category: Option<String>,
    pub description_html: String,
    pub material: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub images: Vec<ImageView>,
    pub colors: Vec<ColorOption>,
    pub sizes: Vec<SizeOption>,
    pub selected_color: String,
    pub selected_size: String,
    pub variant_id: Option<i32>,
    pub sku: Option<String>,
    /// "Only N left" once stock drops to the low-stock threshold.
    pub stock_note: Option<String>,
    pub in_stock: bool,
}

fn selection_url(base: &str, color: &str, size: Option<&str>) -> String {
    let mut out = url::form_urlencoded::Serializer::new(String::new());
    out.append_pair("color", color);
    if let Some(size) = size {
        out.append_pair("size", size);
    }
    format!("{base}?{}", out.finish())
}

impl ProductView {
    fn build(
        detail: &ProductDetail,
        query: &SelectionQuery,
        currency: CurrencyCode,
        low_stock_threshold: i32,
    ) -> Self {
        let product = &detail.product;
        let url = format!("/shop/{}/{}", product.gender.as_str(), product.slug);
        let matrix = detail.matrix();
        let selection = resolve_selection(&matrix, query.color.as_deref(), query.size.as_deref());
        let variant = selection.variant.and_then(|v| detail.variant(v.id));

        let colors = matrix
            .colors()
            .into_iter()
            .map(|name| ColorOption {
                hex: detail
                    .variants
                    .iter()
                    .find(|v| v.color == name)
                    .and_then(|v| v.color_hex.clone())
                    .unwrap_or_else(|| "#cccccc".to_string()),
                url: selection_url(&url, name, selection.size),
                selected: selection.color == Some(name),
                name: name.to_string(),
            })
            .collect();

        let sizes = match selection.color {
            Some(color) => matrix
                .sizes()
                .into_iter()
                .map(|size| SizeOption {
                    url: selection_url(&url, color, Some(size)),
                    selected: selection.size == Some(size),
                    available: matrix.find(color, size).is_some_and(VariantOption::in_stock),
                    size: size.to_string(),
                })
                .collect(),
            None => Vec::new(),
        };

        let unit_price = variant.map_or(product.base_price, |v| v.effective_price(product.base_price));
        let stock = variant.map_or(0, |v| v.stock);

        Self {
            name: product.name.clone(),
            gender_label: product.gender.label(),
            gender_url: format!("/shop/{}", product.gender.as_str()),
            category: detail.category.as_ref().map(|c| c.name.clone()),
            description_html: markdown::render(&product.description),
            material: product.material.clone(),
            price: filters::price(unit_price, currency),
            compare_at_price: product
                .compare_at_price
                .filter(|compare| *compare > unit_price)
                .map(|compare| filters::price(compare, currency)),
            images: detail
                .images
                .iter()
                .map(|img| ImageView {
                    url: img.url.clone(),
                    alt: if img.alt.is_empty() {
                        product.name.clone()
                    } else {
                        img.alt.clone()
                    },
                })
                .collect(),
            colors,
            sizes,
            selected_color: selection.color.unwrap_or_default().to_string(),
            selected_size: selection.size.unwrap_or_default().to_string(),
            variant_id: variant.map(|v| v.id.as_i32()),
            sku: variant.map(|v| v.sku.clone()),
            stock_note: (stock > 0 && stock <= low_stock_threshold)
                .then(|| format!("Only {stock} left")),
            in_stock: stock > 0,
            url,
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductView,
    pub related: Vec<ProductCard>,
}

/// Display product detail page.
#[instrument(skip(state, ctx, query))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path((gender, slug)): Path<(String, String)>,
    Query(query): Query<SelectionQuery>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound(format!("Product not found: {slug}"));
    let gender: Gender = gender.parse().map_err(|_| not_found())?;

    let products = ProductRepository::new(state.pool());
    let detail = products
        .get_by_gender_slug(gender, &slug)
        .await?
        .ok_or_else(not_found)?;
    let related = products.related(&detail.product, RELATED_LIMIT).await?;

    let currency = ctx.settings.currency;
    let product = ProductView::build(&detail, &query, currency, ctx.settings.low_stock_threshold);

    Ok(ProductShowTemplate {
        product,
        related: ProductCard::list(&related, currency),
        ctx,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use solera_core::VariantId;

    fn option(id: i32, color: &str, size: &str, stock: i32) -> VariantOption {
        VariantOption {
            id: VariantId::new(id),
            size: size.to_string(),
            color: color.to_string(),
            stock,
        }
    }

    fn matrix() -> VariantMatrix {
        VariantMatrix::new(vec![
            option(1, "Taba", "38", 0),
            option(2, "Taba", "39", 4),
            option(3, "Siyah", "38", 2),
        ])
    }

    #[test]
    fn test_parse_collects_repeated_keys() {
        let q = ListingQuery::parse(Some(
            "size=38&size=39&size=38&color=Taba&in_stock=1&sort=price_asc&page=2",
        ));
        assert_eq!(q.sizes, vec!["38", "39"]);
        assert_eq!(q.colors, vec!["Taba"]);
        assert!(q.in_stock);
        assert_eq!(q.sort, ProductSort::PriceAsc);
        assert_eq!(q.page, Some(2));
    }

    #[test]
    fn test_parse_ignores_malformed_values() {
        let q = ListingQuery::parse(Some("min_price=abc&sort=cheapest&page=-1&category=+"));
        assert_eq!(q.min_price, None);
        assert_eq!(q.sort, ProductSort::Newest);
        assert_eq!(q.page, None);
        assert_eq!(q.category, None);
    }

    #[test]
    fn test_query_string_drops_page_and_defaults() {
        let q = ListingQuery::parse(Some("q=deri+sandalet&size=40&page=3"));
        assert_eq!(q.to_query_string(), "size=40&q=deri+sandalet");
        assert_eq!(ListingQuery::default().to_query_string(), "");
    }

    #[test]
    fn test_selection_defaults_to_first_in_stock() {
        let m = matrix();
        let sel = resolve_selection(&m, None, None);
        assert_eq!(sel.color, Some("Taba"));
        assert_eq!(sel.size, Some("39"));
        assert_eq!(sel.variant.map(|v| v.id), Some(VariantId::new(2)));
    }

    #[test]
    fn test_selection_keeps_out_of_stock_request() {
        let m = matrix();
        let sel = resolve_selection(&m, Some("Taba"), Some("38"));
        assert_eq!(sel.variant.map(|v| v.id), Some(VariantId::new(1)));
        assert!(!sel.variant.unwrap().in_stock());
    }

    #[test]
    fn test_selection_unknown_color_falls_back() {
        let m = matrix();
        let sel = resolve_selection(&m, Some("Mor"), Some("38"));
        assert_eq!(sel.color, Some("Taba"));
        assert_eq!(sel.size, Some("38"));
    }

    #[test]
    fn test_selection_empty_matrix() {
        let m = VariantMatrix::default();
        let sel = resolve_selection(&m, Some("Taba"), None);
        assert_eq!(sel.color, None);
        assert!(sel.variant.is_none());
    }
}
