//! FAQ repository.

use sqlx::PgPool;

use solera_core::FaqId;

use crate::RepositoryError;
use crate::models::{Faq, FaqInput};

const COLUMNS: &str = "id, question, answer, sort_order, is_active";

pub struct FaqRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FaqRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active entries in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Faq>, RepositoryError> {
        let rows = sqlx::query_as::<_, Faq>(&format!(
            "SELECT {COLUMNS} FROM shop.faq WHERE is_active ORDER BY sort_order, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Every entry, for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Faq>, RepositoryError> {
        let rows = sqlx::query_as::<_, Faq>(&format!(
            "SELECT {COLUMNS} FROM shop.faq ORDER BY sort_order, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &FaqInput) -> Result<Faq, RepositoryError> {
        let row = sqlx::query_as::<_, Faq>(&format!(
            "INSERT INTO shop.faq (question, answer, sort_order, is_active)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(&input.question)
        .bind(&input.answer)
        .bind(input.sort_order)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry doesn't exist.
    pub async fn update(&self, id: FaqId, input: &FaqInput) -> Result<Faq, RepositoryError> {
        sqlx::query_as::<_, Faq>(&format!(
            "UPDATE shop.faq
             SET question = $2, answer = $3, sort_order = $4, is_active = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&input.question)
        .bind(&input.answer)
        .bind(input.sort_order)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry doesn't exist.
    pub async fn delete(&self, id: FaqId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.faq WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
