//! Product repository: listings, detail pages, variants and images.

use sqlx::{PgPool, Postgres, QueryBuilder};

use solera_core::catalog::compare_sizes;
use solera_core::pagination::{Page, Paginated};
use solera_core::{Gender, ImageId, ProductId, VariantId};

use crate::RepositoryError;
use crate::models::{
    CartVariant, Category, Facets, ImageInput, LowStockVariant, Product, ProductDetail, ProductFilter,
    ProductImage, ProductInput, ProductSummary, Variant, VariantInput,
};
use crate::repos::contains_pattern;

const PRODUCT_COLUMNS: &str = "id, category_id, gender, name, slug, description, material, \
     base_price, compare_at_price, is_active, is_featured, created_at, updated_at";

const VARIANT_COLUMNS: &str =
    "id, product_id, sku, size, color, color_hex, price, stock, is_active";

/// Summary projection shared by every listing query. Expects `p` to alias
/// `shop.product`.
const SUMMARY_SELECT: &str = "SELECT p.id, p.gender, p.name, p.slug, p.base_price, \
     p.compare_at_price, c.name AS category_name, \
     (SELECT i.url FROM shop.product_image i WHERE i.product_id = p.id \
      ORDER BY i.position, i.id LIMIT 1) AS image_url, \
     COALESCE((SELECT SUM(v.stock) FROM shop.product_variant v \
      WHERE v.product_id = p.id AND v.is_active), 0)::BIGINT AS total_stock, \
     p.is_active, p.created_at \
     FROM shop.product p LEFT JOIN shop.category c ON c.id = p.category_id";

/// Append the `WHERE` clause for a storefront filter.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE p.is_active");

    if let Some(gender) = filter.gender {
        qb.push(" AND p.gender = ").push_bind(gender);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND c.slug = ").push_bind(category.clone());
    }
    if let Some(collection) = &filter.collection {
        qb.push(
            " AND EXISTS (SELECT 1 FROM shop.collection_product cp \
             JOIN shop.collection col ON col.id = cp.collection_id \
             WHERE cp.product_id = p.id AND col.is_active AND col.slug = ",
        )
        .push_bind(collection.clone())
        .push(")");
    }
    if !filter.sizes.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM shop.product_variant v \
             WHERE v.product_id = p.id AND v.is_active AND v.size = ANY(",
        )
        .push_bind(filter.sizes.clone())
        .push("))");
    }
    if !filter.colors.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM shop.product_variant v \
             WHERE v.product_id = p.id AND v.is_active AND v.color = ANY(",
        )
        .push_bind(filter.colors.clone())
        .push("))");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND p.base_price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND p.base_price <= ").push_bind(max);
    }
    if filter.in_stock_only {
        qb.push(
            " AND EXISTS (SELECT 1 FROM shop.product_variant v \
             WHERE v.product_id = p.id AND v.is_active AND v.stock > 0)",
        );
    }
    if let Some(pattern) = contains_pattern(filter.q.as_deref()) {
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Storefront queries
    // =========================================================================

    /// Search active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn search(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Paginated<ProductSummary>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM shop.product p \
             LEFT JOIN shop.category c ON c.id = p.category_id",
        );
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = select
            .build_query_as::<ProductSummary>()
            .fetch_all(self.pool)
            .await?;

        Ok(Paginated::new(items, page, total))
    }

    /// Distinct sizes and colors among active variants of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn facets(&self, gender: Option<Gender>) -> Result<Facets, RepositoryError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT DISTINCT v.size, v.color
             FROM shop.product_variant v
             JOIN shop.product p ON p.id = v.product_id
             WHERE v.is_active AND p.is_active AND ($1::shop.gender IS NULL OR p.gender = $1)",
        )
        .bind(gender)
        .fetch_all(self.pool)
        .await?;

        let mut facets = Facets::default();
        for (size, color) in rows {
            if !facets.sizes.contains(&size) {
                facets.sizes.push(size);
            }
            if !facets.colors.contains(&color) {
                facets.colors.push(color);
            }
        }
        facets.sizes.sort_by(|a, b| compare_sizes(a, b));
        facets.colors.sort();
        Ok(facets)
    }

    /// Featured active products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductSummary>(&format!(
            "{SUMMARY_SELECT} WHERE p.is_active AND p.is_featured
             ORDER BY p.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Other active products from the same category, falling back to the same
    /// gender line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductSummary>(&format!(
            "{SUMMARY_SELECT}
             WHERE p.is_active AND p.id <> $1 AND p.gender = $2
             ORDER BY (p.category_id IS NOT DISTINCT FROM $3) DESC, p.created_at DESC
             LIMIT $4"
        ))
        .bind(product.id)
        .bind(product.gender)
        .bind(product.category_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Active product by its storefront URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_gender_slug(
        &self,
        gender: Gender,
        slug: &str,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product
             WHERE gender = $1 AND slug = $2 AND is_active"
        ))
        .bind(gender)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        match product {
            Some(product) => Ok(Some(self.load_detail(product).await?)),
            None => Ok(None),
        }
    }

    /// Product by gender and slug, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_slug(
        &self,
        gender: Gender,
        slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE gender = $1 AND slug = $2"
        ))
        .bind(gender)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Any product (active or not) with variants and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match product {
            Some(product) => Ok(Some(self.load_detail(product).await?)),
            None => Ok(None),
        }
    }

    async fn load_detail(&self, product: Product) -> Result<ProductDetail, RepositoryError> {
        let category = match product.category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Category>(
                    "SELECT id, name, slug, description, sort_order
                     FROM shop.category WHERE id = $1",
                )
                .bind(category_id)
                .fetch_optional(self.pool)
                .await?
            }
            None => None,
        };

        let variants = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM shop.product_variant
             WHERE product_id = $1 ORDER BY color, size, id"
        ))
        .bind(product.id)
        .fetch_all(self.pool)
        .await?;

        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, url, alt, position FROM shop.product_image
             WHERE product_id = $1 ORDER BY position, id",
        )
        .bind(product.id)
        .fetch_all(self.pool)
        .await?;

        Ok(ProductDetail {
            product,
            category,
            variants,
            images,
        })
    }

    /// Price and stock data for a set of variants, used to price a cart.
    ///
    /// Only variants that are active on an active product are returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_variants(
        &self,
        ids: &[VariantId],
    ) -> Result<Vec<CartVariant>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(VariantId::as_i32).collect();
        let rows = sqlx::query_as::<_, CartVariant>(
            "SELECT v.id AS variant_id, p.id AS product_id, p.gender, p.slug,
                    p.name AS product_name, v.sku, v.size, v.color,
                    COALESCE(v.price, p.base_price) AS unit_price, v.stock,
                    (SELECT i.url FROM shop.product_image i WHERE i.product_id = p.id
                     ORDER BY i.position, i.id LIMIT 1) AS image_url
             FROM shop.product_variant v
             JOIN shop.product p ON p.id = v.product_id
             WHERE v.id = ANY($1) AND v.is_active AND p.is_active",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    // Admin queries
    // =========================================================================

    /// All products including inactive ones, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        q: Option<&str>,
        page: Page,
    ) -> Result<Paginated<ProductSummary>, RepositoryError> {
        let pattern = contains_pattern(q);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shop.product p WHERE ($1::TEXT IS NULL OR p.name ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        let items = sqlx::query_as::<_, ProductSummary>(&format!(
            "{SUMMARY_SELECT}
             WHERE ($1::TEXT IS NULL OR p.name ILIKE $1)
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Paginated::new(items, page, total))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken for that gender.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO shop.product
                (category_id, gender, name, slug, description, material,
                 base_price, compare_at_price, is_active, is_featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.category_id)
        .bind(input.gender)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.material)
        .bind(input.base_price)
        .bind(input.compare_at_price)
        .bind(input.is_active)
        .bind(input.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique(
            "a product with this slug already exists for this gender",
        ))
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken for that gender.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE shop.product
             SET category_id = $2, gender = $3, name = $4, slug = $5, description = $6,
                 material = $7, base_price = $8, compare_at_price = $9,
                 is_active = $10, is_featured = $11, updated_at = NOW()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.category_id)
        .bind(input.gender)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.material)
        .bind(input.base_price)
        .bind(input.compare_at_price)
        .bind(input.is_active)
        .bind(input.is_featured)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique(
            "a product with this slug already exists for this gender",
        ))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product with its variants and images.
    ///
    /// Order lines keep their copied name/SKU and lose the variant link.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Add a variant to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU or size/color pair exists.
    pub async fn add_variant(
        &self,
        product_id: ProductId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        sqlx::query_as::<_, Variant>(&format!(
            "INSERT INTO shop.product_variant
                (product_id, sku, size, color, color_hex, price, stock, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {VARIANT_COLUMNS}"
        ))
        .bind(product_id)
        .bind(&input.sku)
        .bind(&input.size)
        .bind(&input.color)
        .bind(&input.color_hex)
        .bind(input.price)
        .bind(input.stock.max(0))
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique(
            "SKU or size/color combination already exists",
        ))
    }

    /// Update a variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant doesn't exist.
    /// Returns `RepositoryError::Conflict` if the SKU or size/color pair exists.
    pub async fn update_variant(
        &self,
        id: VariantId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        sqlx::query_as::<_, Variant>(&format!(
            "UPDATE shop.product_variant
             SET sku = $2, size = $3, color = $4, color_hex = $5, price = $6,
                 stock = $7, is_active = $8
             WHERE id = $1
             RETURNING {VARIANT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.sku)
        .bind(&input.size)
        .bind(&input.color)
        .bind(&input.color_hex)
        .bind(input.price)
        .bind(input.stock.max(0))
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique(
            "SKU or size/color combination already exists",
        ))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant doesn't exist.
    pub async fn delete_variant(&self, id: VariantId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product_variant WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Attach an image to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_image(
        &self,
        product_id: ProductId,
        input: &ImageInput,
    ) -> Result<ProductImage, RepositoryError> {
        let image = sqlx::query_as::<_, ProductImage>(
            "INSERT INTO shop.product_image (product_id, url, alt, position)
             VALUES ($1, $2, $3, $4)
             RETURNING id, product_id, url, alt, position",
        )
        .bind(product_id)
        .bind(&input.url)
        .bind(&input.alt)
        .bind(input.position)
        .fetch_one(self.pool)
        .await?;
        Ok(image)
    }

    /// Remove an image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image doesn't exist.
    pub async fn delete_image(&self, id: ImageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product_image WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Active variants at or below `threshold` units.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<LowStockVariant>, RepositoryError> {
        let rows = sqlx::query_as::<_, LowStockVariant>(
            "SELECT v.id AS variant_id, p.id AS product_id, p.name AS product_name,
                    v.sku, v.size, v.color, v.stock
             FROM shop.product_variant v
             JOIN shop.product p ON p.id = v.product_id
             WHERE v.is_active AND p.is_active AND v.stock <= $1
             ORDER BY v.stock, p.name, v.size",
        )
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Count of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM shop.product WHERE is_active")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_sql_binds_every_condition() {
        let filter = ProductFilter {
            gender: Some(Gender::Women),
            category: Some("sandals".to_string()),
            sizes: vec!["38".to_string()],
            in_stock_only: true,
            q: Some("  ".to_string()),
            ..ProductFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM shop.product p");
        push_filter(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("p.gender = $1"));
        assert!(sql.contains("c.slug = $2"));
        assert!(sql.contains("v.size = ANY($3)"));
        assert!(sql.contains("v.stock > 0"));
        assert!(!sql.contains("ILIKE"));
    }
}
