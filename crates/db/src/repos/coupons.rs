//! Coupon repository.

use sqlx::PgPool;

use solera_core::CouponId;

use crate::RepositoryError;
use crate::models::{Coupon, CouponInput};

const COLUMNS: &str = "id, code, kind, value, min_subtotal, max_discount, usage_limit, \
     used_count, starts_at, ends_at, is_active, created_at";

/// Normalise a coupon code as typed by a customer.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Coupon by code, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COLUMNS} FROM shop.coupon WHERE UPPER(code) = $1"
        ))
        .bind(normalize_code(code))
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Coupon by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COLUMNS} FROM shop.coupon WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// All coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COLUMNS} FROM shop.coupon ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Create a coupon. The code is stored upper-cased.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code exists.
    pub async fn create(&self, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        sqlx::query_as::<_, Coupon>(&format!(
            "INSERT INTO shop.coupon
                (code, kind, value, min_subtotal, max_discount, usage_limit,
                 starts_at, ends_at, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        ))
        .bind(normalize_code(&input.code))
        .bind(input.kind)
        .bind(input.value)
        .bind(input.min_subtotal)
        .bind(input.max_discount)
        .bind(input.usage_limit)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique("coupon code already exists"))
    }

    /// Update a coupon. The usage count is preserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    /// Returns `RepositoryError::Conflict` if the code exists.
    pub async fn update(&self, id: CouponId, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        sqlx::query_as::<_, Coupon>(&format!(
            "UPDATE shop.coupon
             SET code = $2, kind = $3, value = $4, min_subtotal = $5, max_discount = $6,
                 usage_limit = $7, starts_at = $8, ends_at = $9, is_active = $10
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(normalize_code(&input.code))
        .bind(input.kind)
        .bind(input.value)
        .bind(input.min_subtotal)
        .bind(input.max_discount)
        .bind(input.usage_limit)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::conflict_on_unique("coupon code already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a coupon. Orders keep the code they were placed with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    pub async fn delete(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.coupon WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  yaz10 "), "YAZ10");
        assert_eq!(normalize_code("HOSGELDIN"), "HOSGELDIN");
    }
}
