//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use solera_db::models::StoreSettings;
use solera_db::{RepositoryError, SettingsRepository};

use crate::config::StorefrontConfig;
use crate::services::locations::Locations;

/// How long store settings are served from memory before re-reading.
const SETTINGS_TTL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    locations: Locations,
    settings: Cache<(), StoreSettings>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled location data cannot be parsed.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, serde_json::Error> {
        let locations = Locations::bundled()?;
        let settings = Cache::builder()
            .max_capacity(1)
            .time_to_live(SETTINGS_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                locations,
                settings,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Deliverable cities and districts.
    #[must_use]
    pub fn locations(&self) -> &Locations {
        &self.inner.locations
    }

    /// Store settings, cached for a minute.
    ///
    /// Concurrent misses share one load.
    ///
    /// # Errors
    ///
    /// Returns the shared `RepositoryError` if the settings cannot be loaded.
    pub async fn settings(&self) -> Result<StoreSettings, Arc<RepositoryError>> {
        self.inner
            .settings
            .try_get_with((), SettingsRepository::new(self.pool()).load())
            .await
    }
}
