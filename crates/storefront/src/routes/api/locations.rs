//! City and district lookup for the shipping form.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::routes::api::ApiError;
use crate::state::AppState;

/// City entry in the lookup response.
#[derive(Debug, Serialize)]
pub struct CityResponse {
    pub id: u16,
    pub name: String,
}

/// All deliverable cities.
///
/// GET /api/locations/cities
pub async fn cities(State(state): State<AppState>) -> Json<Vec<CityResponse>> {
    let cities = state
        .locations()
        .cities()
        .into_iter()
        .map(|c| CityResponse {
            id: c.id,
            name: c.name.to_string(),
        })
        .collect();
    Json(cities)
}

/// Districts of one city.
///
/// GET /api/locations/cities/{id}/districts
pub async fn districts(
    State(state): State<AppState>,
    Path(id): Path<u16>,
) -> Result<Json<Vec<String>>, ApiError> {
    let city = state
        .locations()
        .city(id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Unknown city"))?;
    Ok(Json(city.districts.clone()))
}
