//! Seed the catalog from a YAML file.
//!
//! The file is parsed and checked in full before anything is written.
//! Rows that already exist (same category slug, product gender and slug,
//! collection slug or coupon code) are skipped, so the command can be run
//! again after editing the file to add new entries.
//!
//! ```yaml
//! categories:
//!   - { name: Terlik, slug: terlik }
//! products:
//!   - name: Bodrum
//!     slug: bodrum
//!     gender: women
//!     category: terlik
//!     base_price: "1450.00"
//!     variants:
//!       - { sku: BDR-TABA-37, size: "37", color: Taba, stock: 8 }
//! collections:
//!   - { name: Yaz, slug: yaz, products: [women/bodrum] }
//! coupons:
//!   - { code: HOSGELDIN, kind: percentage, value: "10" }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info, warn};

use solera_core::{CategoryId, CouponKind, Gender, ProductId, Slug};
use solera_db::models::{
    CategoryInput, CollectionInput, CouponInput, ImageInput, ProductInput, VariantInput,
};
use solera_db::repos::normalize_coupon_code;
use solera_db::{
    CategoryRepository, CollectionRepository, CouponRepository, ProductRepository,
    RepositoryError,
};

use super::{ConnectError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error("Category {0} is neither in the file nor in the database")]
    UnknownCategory(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top-level seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
    pub products: Vec<ProductSeed>,
    pub collections: Vec<CollectionSeed>,
    pub coupons: Vec<CouponSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    pub slug: String,
    pub gender: Gender,
    /// Category slug.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub material: Option<String>,
    pub base_price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub variants: Vec<VariantSeed>,
    #[serde(default)]
    pub images: Vec<ImageSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantSeed {
    pub sku: String,
    pub size: String,
    pub color: String,
    #[serde(default)]
    pub color_hex: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSeed {
    pub url: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionSeed {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub sort_order: i32,
    /// Members as `gender/slug`, in display order.
    #[serde(default)]
    pub products: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CouponSeed {
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    #[serde(default)]
    pub min_subtotal: Option<Decimal>,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub usage_limit: Option<i32>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

/// Inserted and skipped counts per section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionCount {
    pub inserted: usize,
    pub skipped: usize,
}

impl SectionCount {
    const fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub categories: SectionCount,
    pub products: SectionCount,
    pub variants: usize,
    pub images: usize,
    pub collections: SectionCount,
    pub coupons: SectionCount,
}

/// Split a `gender/slug` product reference.
fn parse_product_ref(reference: &str) -> Option<(Gender, &str)> {
    let (gender, slug) = reference.split_once('/')?;
    let gender = gender.parse().ok()?;
    Slug::parse(slug).ok()?;
    Some((gender, slug))
}

fn check_slug(errors: &mut Vec<String>, what: &str, slug: &str) {
    if let Err(e) = Slug::parse(slug) {
        errors.push(format!("{what}: slug {slug:?} {e}"));
    }
}

fn check_unique(errors: &mut Vec<String>, seen: &mut HashSet<String>, what: &str, key: &str) {
    if !seen.insert(key.to_owned()) {
        errors.push(format!("{what}: {key} appears more than once"));
    }
}

/// Check a parsed seed file. Returns one message per problem.
#[must_use]
pub fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for category in &seed.categories {
        let what = format!("category {}", category.slug);
        if category.name.trim().is_empty() {
            errors.push(format!("{what}: name is required"));
        }
        check_slug(&mut errors, &what, &category.slug);
        check_unique(&mut errors, &mut seen, "category", &category.slug);
    }

    let mut products = HashSet::new();
    let mut skus = HashSet::new();
    for product in &seed.products {
        let key = format!("{}/{}", product.gender, product.slug);
        let what = format!("product {key}");
        if product.name.trim().is_empty() {
            errors.push(format!("{what}: name is required"));
        }
        check_slug(&mut errors, &what, &product.slug);
        check_unique(&mut errors, &mut products, "product", &key);
        if product.base_price <= Decimal::ZERO {
            errors.push(format!("{what}: base_price must be greater than zero"));
        }
        if product
            .compare_at_price
            .is_some_and(|compare| compare <= product.base_price)
        {
            errors.push(format!("{what}: compare_at_price must exceed base_price"));
        }

        let mut pairs = HashSet::new();
        for variant in &product.variants {
            let sku = variant.sku.trim().to_uppercase();
            if sku.is_empty() {
                errors.push(format!("{what}: variant SKU is required"));
            }
            check_unique(&mut errors, &mut skus, "SKU", &sku);
            if !pairs.insert((variant.size.trim(), variant.color.trim())) {
                errors.push(format!(
                    "{what}: size {} in {} listed twice",
                    variant.size, variant.color
                ));
            }
            if variant.stock < 0 {
                errors.push(format!("{what}: {sku} stock cannot be negative"));
            }
            if variant.price.is_some_and(|p| p <= Decimal::ZERO) {
                errors.push(format!("{what}: {sku} price must be greater than zero"));
            }
            if let Some(hex) = &variant.color_hex
                && !is_hex_color(hex)
            {
                errors.push(format!("{what}: {sku} color_hex must look like #a0522d"));
            }
        }

        for image in &product.images {
            if !(image.url.starts_with("https://") || image.url.starts_with('/')) {
                errors.push(format!("{what}: image url {} must be https or a path", image.url));
            }
        }
    }

    let mut seen = HashSet::new();
    for collection in &seed.collections {
        let what = format!("collection {}", collection.slug);
        if collection.name.trim().is_empty() {
            errors.push(format!("{what}: name is required"));
        }
        check_slug(&mut errors, &what, &collection.slug);
        check_unique(&mut errors, &mut seen, "collection", &collection.slug);
        for reference in &collection.products {
            if parse_product_ref(reference).is_none() {
                errors.push(format!("{what}: {reference:?} is not gender/slug"));
            }
        }
    }

    let mut seen = HashSet::new();
    for coupon in &seed.coupons {
        let code = normalize_coupon_code(&coupon.code);
        let what = format!("coupon {code}");
        if code.is_empty()
            || code.len() > 32
            || !code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push(format!("{what}: code must be 1-32 letters, digits, - or _"));
        }
        check_unique(&mut errors, &mut seen, "coupon", &code);
        if coupon.value <= Decimal::ZERO {
            errors.push(format!("{what}: value must be greater than zero"));
        }
        if coupon.kind == CouponKind::Percentage && coupon.value > Decimal::ONE_HUNDRED {
            errors.push(format!("{what}: a percentage cannot exceed 100"));
        }
        if coupon.usage_limit.is_some_and(|limit| limit < 1) {
            errors.push(format!("{what}: usage_limit must be at least 1"));
        }
        if let (Some(starts), Some(ends)) = (coupon.starts_at, coupon.ends_at)
            && ends <= starts
        {
            errors.push(format!("{what}: ends_at must be after starts_at"));
        }
    }

    errors
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value.chars().skip(1).all(|c| c.is_ascii_hexdigit())
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// references an unknown category, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        collections = seed.collections.len(),
        coupons = seed.coupons.len(),
        "Catalog validated"
    );

    let pool = connect().await?;
    let summary = Seeder::new(&pool).run(&seed).await?;

    info!("Seeding complete!");
    log_section("Categories", summary.categories);
    log_section("Products", summary.products);
    info!("  Variants inserted: {}", summary.variants);
    info!("  Images inserted: {}", summary.images);
    log_section("Collections", summary.collections);
    log_section("Coupons", summary.coupons);
    Ok(())
}

fn log_section(label: &str, count: SectionCount) {
    info!(
        "  {label}: {} inserted, {} skipped (already exist)",
        count.inserted, count.skipped
    );
}

/// Writes a validated seed file through the repositories.
struct Seeder<'a> {
    pool: &'a PgPool,
    categories: HashMap<String, CategoryId>,
    products: HashMap<(Gender, String), ProductId>,
    summary: SeedSummary,
}

impl<'a> Seeder<'a> {
    fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            categories: HashMap::new(),
            products: HashMap::new(),
            summary: SeedSummary::default(),
        }
    }

    async fn run(mut self, seed: &CatalogSeed) -> Result<SeedSummary, SeedError> {
        self.resolve_categories(seed).await?;
        for category in &seed.categories {
            self.category(category).await?;
        }
        for product in &seed.products {
            self.product(product).await?;
        }
        for collection in &seed.collections {
            self.collection(collection).await?;
        }
        for coupon in &seed.coupons {
            self.coupon(coupon).await?;
        }
        Ok(self.summary)
    }

    /// Fail before writing if a product names a category that exists
    /// nowhere.
    async fn resolve_categories(&mut self, seed: &CatalogSeed) -> Result<(), SeedError> {
        let in_file: HashSet<&str> = seed.categories.iter().map(|c| c.slug.as_str()).collect();
        let repo = CategoryRepository::new(self.pool);

        for slug in seed.products.iter().filter_map(|p| p.category.as_deref()) {
            if in_file.contains(slug) || self.categories.contains_key(slug) {
                continue;
            }
            let category = repo
                .get_by_slug(slug)
                .await?
                .ok_or_else(|| SeedError::UnknownCategory(slug.to_owned()))?;
            self.categories.insert(slug.to_owned(), category.id);
        }
        Ok(())
    }

    async fn category(&mut self, seed: &CategorySeed) -> Result<(), SeedError> {
        let repo = CategoryRepository::new(self.pool);
        let (id, inserted) = match repo.get_by_slug(&seed.slug).await? {
            Some(existing) => (existing.id, false),
            None => {
                let input = CategoryInput {
                    name: seed.name.trim().to_owned(),
                    slug: seed.slug.clone(),
                    description: seed.description.clone(),
                    sort_order: seed.sort_order,
                };
                (repo.create(&input).await?.id, true)
            }
        };
        self.categories.insert(seed.slug.clone(), id);
        self.summary.categories.record(inserted);
        Ok(())
    }

    async fn product(&mut self, seed: &ProductSeed) -> Result<(), SeedError> {
        let repo = ProductRepository::new(self.pool);
        let key = (seed.gender, seed.slug.clone());

        if let Some(existing) = repo.find_by_slug(seed.gender, &seed.slug).await? {
            self.products.insert(key, existing.id);
            self.summary.products.record(false);
            return Ok(());
        }

        let input = ProductInput {
            category_id: seed
                .category
                .as_ref()
                .and_then(|slug| self.categories.get(slug).copied()),
            gender: seed.gender,
            name: seed.name.trim().to_owned(),
            slug: seed.slug.clone(),
            description: seed.description.trim().to_owned(),
            material: seed.material.clone(),
            base_price: seed.base_price,
            compare_at_price: seed.compare_at_price,
            is_active: seed.active,
            is_featured: seed.featured,
        };
        let product = repo.create(&input).await?;

        for variant in &seed.variants {
            let input = VariantInput {
                sku: variant.sku.trim().to_uppercase(),
                size: variant.size.trim().to_owned(),
                color: variant.color.trim().to_owned(),
                color_hex: variant.color_hex.as_deref().map(str::to_lowercase),
                price: variant.price,
                stock: variant.stock,
                is_active: variant.active,
            };
            match repo.add_variant(product.id, &input).await {
                Ok(_) => self.summary.variants += 1,
                Err(RepositoryError::Conflict(message)) => {
                    warn!(sku = %input.sku, %message, "variant skipped");
                }
                Err(e) => return Err(e.into()),
            }
        }

        for (position, image) in (0_i32..).zip(&seed.images) {
            let input = ImageInput {
                url: image.url.clone(),
                alt: if image.alt.is_empty() {
                    seed.name.clone()
                } else {
                    image.alt.clone()
                },
                position,
            };
            repo.add_image(product.id, &input).await?;
            self.summary.images += 1;
        }

        info!(product_id = %product.id, slug = %product.slug, "product created");
        self.products.insert(key, product.id);
        self.summary.products.record(true);
        Ok(())
    }

    async fn product_id(&self, gender: Gender, slug: &str) -> Result<Option<ProductId>, SeedError> {
        if let Some(id) = self.products.get(&(gender, slug.to_owned())) {
            return Ok(Some(*id));
        }
        let found = ProductRepository::new(self.pool)
            .find_by_slug(gender, slug)
            .await?;
        Ok(found.map(|p| p.id))
    }

    async fn collection(&mut self, seed: &CollectionSeed) -> Result<(), SeedError> {
        let repo = CollectionRepository::new(self.pool);
        let input = CollectionInput {
            name: seed.name.trim().to_owned(),
            slug: seed.slug.clone(),
            description: seed.description.trim().to_owned(),
            image_url: seed.image_url.clone(),
            is_active: seed.active,
            sort_order: seed.sort_order,
        };

        let collection = match repo.create(&input).await {
            Ok(collection) => collection,
            Err(RepositoryError::Conflict(_)) => {
                self.summary.collections.record(false);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut members = Vec::with_capacity(seed.products.len());
        for reference in &seed.products {
            let Some((gender, slug)) = parse_product_ref(reference) else {
                continue;
            };
            match self.product_id(gender, slug).await? {
                Some(id) if !members.contains(&id) => members.push(id),
                Some(_) => {}
                None => warn!(collection = %seed.slug, product = %reference, "unknown product skipped"),
            }
        }
        repo.set_members(collection.id, &members).await?;

        self.summary.collections.record(true);
        Ok(())
    }

    async fn coupon(&mut self, seed: &CouponSeed) -> Result<(), SeedError> {
        let repo = CouponRepository::new(self.pool);
        let code = normalize_coupon_code(&seed.code);

        if repo.get_by_code(&code).await?.is_some() {
            self.summary.coupons.record(false);
            return Ok(());
        }

        let input = CouponInput {
            code,
            kind: seed.kind,
            value: seed.value,
            min_subtotal: seed.min_subtotal,
            max_discount: seed.max_discount,
            usage_limit: seed.usage_limit,
            starts_at: seed.starts_at,
            ends_at: seed.ends_at,
            is_active: seed.active,
        };
        repo.create(&input).await?;
        self.summary.coupons.record(true);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../../../../seeds/catalog.yaml");

    fn parse(yaml: &str) -> CatalogSeed {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_sample_catalog_is_valid() {
        let seed = parse(SAMPLE);
        assert!(!seed.products.is_empty());
        assert!(!seed.coupons.is_empty());
        assert_eq!(validate(&seed), Vec::<String>::new());
    }

    #[test]
    fn test_defaults_apply() {
        let seed = parse(
            r#"
products:
  - name: Bodrum
    slug: bodrum
    gender: women
    base_price: "1450.00"
    variants:
      - { sku: bdr-37, size: "37", color: Taba }
"#,
        );
        let product = seed.products.first().unwrap();
        assert!(product.active);
        assert!(!product.featured);
        assert_eq!(product.base_price, Decimal::new(145_000, 2));
        let variant = product.variants.first().unwrap();
        assert_eq!(variant.stock, 0);
        assert!(variant.active);
        assert!(seed.categories.is_empty());
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn test_unknown_field_and_gender_rejected() {
        assert!(serde_yaml::from_str::<CatalogSeed>("brands: []").is_err());
        assert!(
            serde_yaml::from_str::<CatalogSeed>(
                "products:\n  - { name: A, slug: a, gender: kids, base_price: \"1\" }"
            )
            .is_err()
        );
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let seed = parse(
            r##"
categories:
  - { name: Terlik, slug: terlik }
  - { name: Terlik 2, slug: terlik }
products:
  - name: Bodrum
    slug: Bodrum
    gender: women
    base_price: "100"
    compare_at_price: "90"
    variants:
      - { sku: X-1, size: "37", color: Taba, color_hex: "brown" }
      - { sku: x-1, size: "37", color: Taba, stock: -1 }
collections:
  - { name: Yaz, slug: yaz, products: [bodrum] }
coupons:
  - { code: " yaz 10 ", kind: percentage, value: "120", usage_limit: 0 }
"##,
        );
        let errors = validate(&seed);
        let has = |needle: &str| errors.iter().any(|e| e.contains(needle));

        assert!(has("category: terlik appears more than once"));
        assert!(has("product women/Bodrum: slug"));
        assert!(has("compare_at_price must exceed base_price"));
        assert!(has("color_hex"));
        assert!(has("SKU: X-1 appears more than once"));
        assert!(has("size 37 in Taba listed twice"));
        assert!(has("stock cannot be negative"));
        assert!(has("\"bodrum\" is not gender/slug"));
        assert!(has("code must be"));
        assert!(has("a percentage cannot exceed 100"));
        assert!(has("usage_limit must be at least 1"));
    }

    #[test]
    fn test_parse_product_ref() {
        assert_eq!(
            parse_product_ref("men/ege-deri"),
            Some((Gender::Men, "ege-deri"))
        );
        assert_eq!(parse_product_ref("ege-deri"), None);
        assert_eq!(parse_product_ref("kids/ege"), None);
        assert_eq!(parse_product_ref("men/Ege"), None);
    }

    #[test]
    fn test_section_count() {
        let mut count = SectionCount::default();
        count.record(true);
        count.record(false);
        count.record(true);
        assert_eq!(
            count,
            SectionCount {
                inserted: 2,
                skipped: 1
            }
        );
    }
}
