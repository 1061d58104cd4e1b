//! Settings database operations.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::RepositoryError;
use crate::models::StoreSettings;

/// Repository for the `shop.setting` key/value table.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load store settings, filling in defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load(&self) -> Result<StoreSettings, RepositoryError> {
        let rows: Vec<(String, JsonValue)> = sqlx::query_as("SELECT key, value FROM shop.setting")
            .fetch_all(self.pool)
            .await?;
        Ok(StoreSettings::from_pairs(rows))
    }

    /// Persist every field of `settings`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if serialization fails and
    /// `RepositoryError::Database` if a write fails.
    pub async fn save(&self, settings: &StoreSettings) -> Result<(), RepositoryError> {
        let pairs = settings
            .to_pairs()
            .map_err(|e| RepositoryError::DataCorruption(format!("settings encode: {e}")))?;

        let mut tx = self.pool.begin().await?;
        for (key, value) in pairs {
            sqlx::query(
                "INSERT INTO shop.setting (key, value)
                 VALUES ($1, $2)
                 ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()",
            )
            .bind(&key)
            .bind(&value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
