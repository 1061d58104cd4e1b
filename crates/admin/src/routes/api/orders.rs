//! Order API: listing, detail and status changes as JSON.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use solera_core::pagination::{Page, Paginated};
use solera_core::{OrderId, OrderStatus};
use solera_db::OrderRepository;
use solera_db::models::{Order, OrderItem, OrderSummary, ShipmentInfo, StatusHistoryEntry};

use crate::error::AppError;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::routes::orders::parse_status_filter;
use crate::routes::pagination::PER_PAGE;
use crate::state::AppState;

use super::ApiError;

/// GET /api/orders query.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// GET /api/orders/{id} response.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<StatusHistoryEntry>,
    /// Statuses the order may move to next.
    pub next_statuses: Vec<OrderStatus>,
}

/// POST /api/orders/{id}/status body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Paginated order listing.
#[instrument(skip(_admin, state))]
pub async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Paginated<OrderSummary>>, ApiError> {
    let orders = OrderRepository::new(state.pool())
        .list(
            parse_status_filter(query.status.as_deref()),
            query.q.as_deref(),
            Page::new(query.page, PER_PAGE),
        )
        .await?;
    Ok(Json(orders))
}

async fn load(state: &AppState, id: OrderId) -> Result<OrderResponse, ApiError> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))?;

    Ok(OrderResponse {
        next_statuses: detail.order.status.next_options(),
        order: detail.order,
        items: detail.items,
        history: detail.history,
    })
}

/// One order with its lines and history.
#[instrument(skip(_admin, state))]
pub async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    load(&state, id).await.map(Json)
}

/// Move an order to another status. Disallowed moves get a 409.
#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
pub async fn update_status(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    if body.note.as_deref().is_some_and(|n| n.chars().count() > 1000) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "note must be at most 1000 characters",
        ));
    }

    let shipment = ShipmentInfo {
        carrier: body.carrier,
        tracking_number: body.tracking_number,
    };
    let note = body
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    OrderRepository::new(state.pool())
        .update_status(id, body.status, note, Some(admin.id), &shipment)
        .await?;

    load(&state, id).await.map(Json)
}
