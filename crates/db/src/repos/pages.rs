//! Static page repository.

use sqlx::PgPool;

use solera_core::PageId;

use crate::RepositoryError;
use crate::models::{Page, PageInput};

const COLUMNS: &str = "id, slug, title, body_markdown, is_published, updated_at";

/// Repository for markdown content pages.
pub struct PageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PageRepository<'a> {
    /// Create a new page repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published page by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published(&self, slug: &str) -> Result<Option<Page>, RepositoryError> {
        let row = sqlx::query_as::<_, Page>(&format!(
            "SELECT {COLUMNS} FROM shop.page WHERE slug = $1 AND is_published"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Published pages for the footer, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self) -> Result<Vec<Page>, RepositoryError> {
        let rows = sqlx::query_as::<_, Page>(&format!(
            "SELECT {COLUMNS} FROM shop.page WHERE is_published ORDER BY title"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Every page, for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Page>, RepositoryError> {
        let rows = sqlx::query_as::<_, Page>(&format!(
            "SELECT {COLUMNS} FROM shop.page ORDER BY title"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Page by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PageId) -> Result<Option<Page>, RepositoryError> {
        let row = sqlx::query_as::<_, Page>(&format!(
            "SELECT {COLUMNS} FROM shop.page WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Create a page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &PageInput) -> Result<Page, RepositoryError> {
        sqlx::query_as::<_, Page>(&format!(
            "INSERT INTO shop.page (slug, title, body_markdown, is_published)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.body_markdown)
        .bind(input.is_published)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique("page slug already exists"))
    }

    /// Update a page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the page doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(&self, id: PageId, input: &PageInput) -> Result<Page, RepositoryError> {
        sqlx::query_as::<_, Page>(&format!(
            "UPDATE shop.page
             SET slug = $2, title = $3, body_markdown = $4, is_published = $5,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.body_markdown)
        .bind(input.is_published)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique("page slug already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the page doesn't exist.
    pub async fn delete(&self, id: PageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.page WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
