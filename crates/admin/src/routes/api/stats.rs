//! Dashboard numbers as JSON.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use solera_core::CurrencyCode;
use solera_db::models::DashboardStats;
use solera_db::{OrderRepository, SettingsRepository};

use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

use super::ApiError;

/// GET /api/stats response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub currency: CurrencyCode,
    #[serde(flatten)]
    pub stats: DashboardStats,
}

/// Headline numbers for the dashboard.
#[instrument(skip_all)]
pub async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let settings = SettingsRepository::new(state.pool()).load().await?;
    let stats = OrderRepository::new(state.pool()).dashboard_stats().await?;

    Ok(Json(StatsResponse {
        currency: settings.currency,
        stats,
    }))
}
