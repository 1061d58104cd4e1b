//! Banner repository.

use sqlx::PgPool;

use solera_core::BannerId;

use crate::RepositoryError;
use crate::models::{Banner, BannerInput};

const COLUMNS: &str =
    "id, title, subtitle, image_url, link_url, position, is_active, starts_at, ends_at";

/// Repository for home page banners.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    /// Create a new banner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Banners that are active and inside their schedule window right now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_live(&self) -> Result<Vec<Banner>, RepositoryError> {
        let rows = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {COLUMNS} FROM shop.banner
             WHERE is_active
               AND (starts_at IS NULL OR starts_at <= NOW())
               AND (ends_at IS NULL OR ends_at >= NOW())
             ORDER BY position, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Every banner, for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Banner>, RepositoryError> {
        let rows = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {COLUMNS} FROM shop.banner ORDER BY position, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Create a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &BannerInput) -> Result<Banner, RepositoryError> {
        let row = sqlx::query_as::<_, Banner>(&format!(
            "INSERT INTO shop.banner
                (title, subtitle, image_url, link_url, position, is_active, starts_at, ends_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(&input.link_url)
        .bind(input.position)
        .bind(input.is_active)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Update a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    pub async fn update(&self, id: BannerId, input: &BannerInput) -> Result<Banner, RepositoryError> {
        sqlx::query_as::<_, Banner>(&format!(
            "UPDATE shop.banner
             SET title = $2, subtitle = $3, image_url = $4, link_url = $5,
                 position = $6, is_active = $7, starts_at = $8, ends_at = $9
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.image_url)
        .bind(&input.link_url)
        .bind(input.position)
        .bind(input.is_active)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    pub async fn delete(&self, id: BannerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.banner WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
