//! Catalog types: categories, products, variants, images and collections.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solera_core::catalog::{VariantMatrix, VariantOption};
use solera_core::{CategoryId, CollectionId, Gender, ImageId, ProductId, VariantId};

/// A product category (sandals, slides, espadrilles...).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sort_order: i32,
}

/// Fields for creating or updating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sort_order: i32,
}

/// A product as stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub gender: Gender,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub material: Option<String>,
    pub base_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product shows a struck-through original price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price
            .is_some_and(|compare| compare > self.base_price)
    }
}

/// Fields for creating or updating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub category_id: Option<CategoryId>,
    pub gender: Gender,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub material: Option<String>,
    pub base_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub is_active: bool,
    pub is_featured: bool,
}

/// Listing card data for a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub id: ProductId,
    pub gender: Gender,
    pub name: String,
    pub slug: String,
    pub base_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub category_name: Option<String>,
    pub image_url: Option<String>,
    pub total_stock: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ProductSummary {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.total_stock > 0
    }

    /// Storefront URL of the product page.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/shop/{}/{}", self.gender, self.slug)
    }
}

/// One size/color combination of a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub color_hex: Option<String>,
    /// Overrides the product's base price when set.
    pub price: Option<Decimal>,
    pub stock: i32,
    pub is_active: bool,
}

impl Variant {
    #[must_use]
    pub fn effective_price(&self, base_price: Decimal) -> Decimal {
        self.price.unwrap_or(base_price)
    }
}

/// Fields for creating or updating a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantInput {
    pub sku: String,
    pub size: String,
    pub color: String,
    pub color_hex: Option<String>,
    pub price: Option<Decimal>,
    pub stock: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    pub url: String,
    pub alt: String,
    pub position: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageInput {
    pub url: String,
    pub alt: String,
    pub position: i32,
}

/// A product with everything its detail page needs.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Option<Category>,
    pub variants: Vec<Variant>,
    pub images: Vec<ProductImage>,
}

impl ProductDetail {
    /// Size/color matrix over the active variants.
    #[must_use]
    pub fn matrix(&self) -> VariantMatrix {
        VariantMatrix::new(
            self.variants
                .iter()
                .filter(|v| v.is_active)
                .map(|v| VariantOption {
                    id: v.id,
                    size: v.size.clone(),
                    color: v.color.clone(),
                    stock: v.stock,
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    pub const ALL: [Self; 4] = [Self::Newest, Self::PriceAsc, Self::PriceDesc, Self::Name];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }

    /// SQL `ORDER BY` clause. Only ever one of these fixed strings.
    pub(crate) const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::PriceAsc => "p.base_price ASC, p.id ASC",
            Self::PriceDesc => "p.base_price DESC, p.id DESC",
            Self::Name => "p.name ASC, p.id ASC",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .ok_or_else(|| format!("unknown sort: {s}"))
    }
}

/// Storefront listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub gender: Option<Gender>,
    pub category: Option<String>,
    pub collection: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock_only: bool,
    pub q: Option<String>,
    pub sort: ProductSort,
}

/// Sizes and colors offered across active products, for filter sidebars.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Facets {
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
}

/// A purchasable variant with its current price, for cart rendering.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartVariant {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub gender: Gender,
    pub slug: String,
    pub product_name: String,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub unit_price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
}

/// A variant running low on stock.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockVariant {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInput {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: i32, size: &str, stock: i32, active: bool) -> Variant {
        Variant {
            id: VariantId::new(id),
            product_id: ProductId::new(1),
            sku: format!("SKU-{id}"),
            size: size.to_string(),
            color: "Taba".to_string(),
            color_hex: None,
            price: None,
            stock,
            is_active: active,
        }
    }

    #[test]
    fn test_sort_parses_query_values() {
        for sort in ProductSort::ALL {
            assert_eq!(sort.as_str().parse::<ProductSort>(), Ok(sort));
        }
        assert!("cheapest".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_variant_price_override() {
        let mut v = variant(1, "38", 1, true);
        assert_eq!(v.effective_price(Decimal::new(900, 0)), Decimal::new(900, 0));
        v.price = Some(Decimal::new(950, 0));
        assert_eq!(v.effective_price(Decimal::new(900, 0)), Decimal::new(950, 0));
    }

    #[test]
    fn test_matrix_skips_inactive_variants() {
        let now = Utc::now();
        let detail = ProductDetail {
            product: Product {
                id: ProductId::new(1),
                category_id: None,
                gender: Gender::Women,
                name: "Bodrum".to_string(),
                slug: "bodrum".to_string(),
                description: String::new(),
                material: None,
                base_price: Decimal::new(900, 0),
                compare_at_price: Some(Decimal::new(1100, 0)),
                is_active: true,
                is_featured: false,
                created_at: now,
                updated_at: now,
            },
            category: None,
            variants: vec![variant(1, "38", 2, true), variant(2, "39", 5, false)],
            images: vec![],
        };
        assert_eq!(detail.matrix().sizes(), vec!["38"]);
        assert_eq!(detail.matrix().total_stock(), 2);
        assert!(detail.product.is_on_sale());
        assert!(detail.variant(VariantId::new(2)).is_some());
    }
}
