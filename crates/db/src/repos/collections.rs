//! Collection repository.

use sqlx::PgPool;

use solera_core::{CollectionId, ProductId};

use crate::RepositoryError;
use crate::models::{Collection, CollectionInput};

const COLUMNS: &str = "id, name, slug, description, image_url, is_active, sort_order";

/// Repository for curated product collections.
pub struct CollectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CollectionRepository<'a> {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active collections in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Collection>, RepositoryError> {
        let rows = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {COLUMNS} FROM shop.collection
             WHERE is_active ORDER BY sort_order, name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Every collection, for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Collection>, RepositoryError> {
        let rows = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {COLUMNS} FROM shop.collection ORDER BY sort_order, name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Active collection by slug. Its products are fetched through
    /// `ProductRepository::search` with a collection filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Collection>, RepositoryError> {
        let row = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {COLUMNS} FROM shop.collection WHERE slug = $1 AND is_active"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Collection by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CollectionId) -> Result<Option<Collection>, RepositoryError> {
        let row = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {COLUMNS} FROM shop.collection WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Product IDs in a collection, in position order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn member_ids(&self, id: CollectionId) -> Result<Vec<ProductId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, ProductId>(
            "SELECT product_id FROM shop.collection_product
             WHERE collection_id = $1 ORDER BY position, product_id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }

    /// Create a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &CollectionInput) -> Result<Collection, RepositoryError> {
        sqlx::query_as::<_, Collection>(&format!(
            "INSERT INTO shop.collection
                (name, slug, description, image_url, is_active, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.is_active)
        .bind(input.sort_order)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique("collection slug already exists"))
    }

    /// Update a collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CollectionId,
        input: &CollectionInput,
    ) -> Result<Collection, RepositoryError> {
        sqlx::query_as::<_, Collection>(&format!(
            "UPDATE shop.collection
             SET name = $2, slug = $3, description = $4, image_url = $5,
                 is_active = $6, sort_order = $7
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.is_active)
        .bind(input.sort_order)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique("collection slug already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Replace the collection's products. Positions follow the slice order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails (for example an
    /// unknown product ID).
    pub async fn set_members(
        &self,
        id: CollectionId,
        products: &[ProductId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM shop.collection_product WHERE collection_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let ids: Vec<i32> = products.iter().map(ProductId::as_i32).collect();
        sqlx::query(
            "INSERT INTO shop.collection_product (collection_id, product_id, position)
             SELECT $1, member.product_id, (member.ord - 1)::INTEGER
             FROM UNNEST($2::INTEGER[]) WITH ORDINALITY AS member(product_id, ord)
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a collection. Products are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection doesn't exist.
    pub async fn delete(&self, id: CollectionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.collection WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
