//! Order management route handlers.
//!
//! Orders are placed by the storefront; the panel lists them, shows the
//! detail with its status history, moves them along the lifecycle and
//! records payments settled outside the site.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use solera_core::pagination::Page;
use solera_core::{OrderId, OrderStatus, PaymentStatus};
use solera_db::models::{OrderDetail, OrderItem, OrderSummary, ShipmentInfo, StatusHistoryEntry};
use solera_db::{OrderRepository, RepositoryError};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireWriteAccess};
use crate::state::AppState;

use super::dashboard::AdminUserView;
use super::forms::optional_text;
use super::pagination::{PER_PAGE, PageLinks};
use super::{Notice, redirect_error, redirect_success};

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", post(update_status))
        .route("/orders/{id}/paid", post(mark_paid))
}

// =============================================================================
// Query Parameters & Forms
// =============================================================================

/// Query parameters for the orders list.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub tracking_number: String,
}

/// Parse a status filter value; blank or unknown means "all".
#[must_use]
pub fn parse_status_filter(raw: Option<&str>) -> Option<OrderStatus> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

// =============================================================================
// View Types
// =============================================================================

/// CSS modifier for a payment status badge.
#[must_use]
pub const fn payment_class(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Paid => "paid",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Refunded => "refunded",
    }
}

/// CSS modifier for an order status badge.
#[must_use]
pub fn status_class(status: OrderStatus) -> String {
    status.as_str().to_ascii_lowercase()
}

/// Order listing row.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub url: String,
    pub order_number: String,
    pub customer: String,
    pub email: String,
    pub status: String,
    pub status_class: String,
    pub payment: String,
    pub payment_class: String,
    pub total: String,
    pub item_count: i64,
    pub placed_at: String,
}

impl From<&OrderSummary> for OrderRow {
    fn from(order: &OrderSummary) -> Self {
        Self {
            url: format!("/orders/{}", order.id),
            order_number: order.order_number.clone(),
            customer: order.full_name.clone(),
            email: order.email.clone(),
            status: order.status.label().to_string(),
            status_class: status_class(order.status),
            payment: order.payment_status.label().to_string(),
            payment_class: payment_class(order.payment_status).to_string(),
            total: filters::price_in(order.total, &order.currency),
            item_count: order.item_count,
            placed_at: filters::datetime(order.created_at),
        }
    }
}

/// Status filter tab.
#[derive(Debug, Clone)]
pub struct StatusTab {
    pub label: &'static str,
    pub url: String,
    pub active: bool,
}

fn status_tabs(selected: Option<OrderStatus>, q: &str) -> Vec<StatusTab> {
    let search = if q.is_empty() {
        String::new()
    } else {
        format!("q={}", urlencoding::encode(q))
    };
    let url = |status: Option<OrderStatus>| {
        let mut params = Vec::new();
        if let Some(status) = status {
            params.push(format!("status={}", status.as_str()));
        }
        if !search.is_empty() {
            params.push(search.clone());
        }
        if params.is_empty() {
            "/orders".to_string()
        } else {
            format!("/orders?{}", params.join("&"))
        }
    };

    std::iter::once(StatusTab {
        label: "All",
        url: url(None),
        active: selected.is_none(),
    })
    .chain(OrderStatus::ALL.into_iter().map(|status| StatusTab {
        label: status.label(),
        url: url(Some(status)),
        active: selected == Some(status),
    }))
    .collect()
}

/// Order line on the detail page.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub product_name: String,
    pub sku: String,
    pub option: String,
    pub unit_price: String,
    pub quantity: i32,
    pub line_total: String,
}

impl OrderItemView {
    fn new(item: &OrderItem, currency: &str) -> Self {
        Self {
            product_name: item.product_name.clone(),
            sku: item.sku.clone(),
            option: format!("{} / {}", item.color, item.size),
            unit_price: filters::price_in(item.unit_price, currency),
            quantity: item.quantity,
            line_total: filters::price_in(item.line_total, currency),
        }
    }
}

/// Status history row.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub status: String,
    pub note: Option<String>,
    pub by: String,
    pub at: String,
}

impl From<&StatusHistoryEntry> for HistoryView {
    fn from(entry: &StatusHistoryEntry) -> Self {
        Self {
            status: entry.status.label().to_string(),
            note: entry.note.clone(),
            by: entry
                .admin_name
                .clone()
                .unwrap_or_else(|| "Customer".to_string()),
            at: filters::datetime(entry.created_at),
        }
    }
}

/// Option in the status change select.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Order detail view.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: OrderId,
    pub order_number: String,
    pub placed_at: String,
    pub status: String,
    pub status_class: String,
    pub payment: String,
    pub payment_class: String,
    pub payment_method: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub note: Option<String>,
    pub subtotal: String,
    pub discount: Option<String>,
    pub coupon_code: Option<String>,
    pub shipping: String,
    pub total: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub paid_at: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
    pub can_mark_paid: bool,
    pub tracking_url: Option<String>,
}

impl OrderView {
    fn new(detail: &OrderDetail, tracking_url: Option<String>) -> Self {
        let order = &detail.order;
        let currency = order.currency.as_str();
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            placed_at: filters::datetime(order.created_at),
            status: order.status.label().to_string(),
            status_class: status_class(order.status),
            payment: order.payment_status.label().to_string(),
            payment_class: payment_class(order.payment_status).to_string(),
            payment_method: order.payment_method.label().to_string(),
            full_name: order.full_name.clone(),
            email: order.email.clone(),
            phone: order.phone.clone(),
            address: format!(
                "{}, {} / {} {}",
                order.address_line, order.district, order.city, order.postal_code
            )
            .trim_end()
            .to_string(),
            note: order.note.clone(),
            subtotal: filters::price_in(order.subtotal, currency),
            discount: (!order.discount.is_zero())
                .then(|| filters::price_in(order.discount, currency)),
            coupon_code: order.coupon_code.clone(),
            shipping: filters::price_in(order.shipping, currency),
            total: filters::price_in(order.total, currency),
            carrier: order.carrier.clone(),
            tracking_number: order.tracking_number.clone(),
            paid_at: order.paid_at.map(filters::datetime),
            shipped_at: order.shipped_at.map(filters::datetime),
            delivered_at: order.delivered_at.map(filters::datetime),
            can_mark_paid: matches!(
                order.payment_status,
                PaymentStatus::Pending | PaymentStatus::Failed
            ),
            tracking_url,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Orders list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub orders: Vec<OrderRow>,
    pub tabs: Vec<StatusTab>,
    pub status: String,
    pub q: String,
    pub pagination: PageLinks,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
    pub history: Vec<HistoryView>,
    pub next_options: Vec<StatusOption>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Orders list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersIndexTemplate> {
    let status = parse_status_filter(query.status.as_deref());
    let q = query.q.as_deref().map(str::trim).unwrap_or_default().to_string();

    let orders = OrderRepository::new(state.pool())
        .list(
            status,
            Some(q.as_str()).filter(|q| !q.is_empty()),
            Page::new(query.page, PER_PAGE),
        )
        .await?;

    let status_param = status.map(OrderStatus::as_str).unwrap_or_default();
    let pagination = PageLinks::new(&orders, "/orders", &[("status", status_param), ("q", &q)]);
    let (success_message, error_message) = Notice {
        success: query.success,
        error: query.error,
    }
    .into_messages();

    Ok(OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        success_message,
        error_message,
        orders: orders.items.iter().map(OrderRow::from).collect(),
        tabs: status_tabs(status, &q),
        status: status_param.to_string(),
        q,
        pagination,
    })
}

/// Order detail page handler.
#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Query(notice): Query<Notice>,
) -> Result<OrderShowTemplate> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))?;

    let tracking_url =
        state.storefront_link(&format!("/orders/{}", detail.order.tracking_token));
    let next_options = detail
        .order
        .status
        .next_options()
        .into_iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
        })
        .collect();
    let currency = detail.order.currency.clone();
    let (success_message, error_message) = notice.into_messages();

    Ok(OrderShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        success_message,
        error_message,
        order: OrderView::new(&detail, tracking_url),
        items: detail
            .items
            .iter()
            .map(|item| OrderItemView::new(item, &currency))
            .collect(),
        history: detail.history.iter().map(HistoryView::from).collect(),
        next_options,
    })
}

/// Move an order to another status.
#[instrument(skip(admin, state, form), fields(admin_id = %admin.id))]
pub async fn update_status(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let back = format!("/orders/{id}");
    let Ok(next) = form.status.parse::<OrderStatus>() else {
        return Ok(redirect_error(&back, "Choose a status"));
    };

    let shipment = ShipmentInfo {
        carrier: optional_text(&form.carrier),
        tracking_number: optional_text(&form.tracking_number),
    };

    match OrderRepository::new(state.pool())
        .update_status(id, next, optional_text(&form.note).as_deref(), Some(admin.id), &shipment)
        .await
    {
        Ok(order) => Ok(redirect_success(
            &back,
            &format!("Order {} is now {}", order.order_number, order.status.label()),
        )),
        Err(e) => match AppError::from(e) {
            AppError::Transition(transition) => Ok(redirect_error(&back, &transition.to_string())),
            other => Err(other),
        },
    }
}

/// Record that payment was received.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
pub async fn mark_paid(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    let back = format!("/orders/{id}");
    match OrderRepository::new(state.pool()).mark_paid(id).await {
        Ok(()) => {
            tracing::info!(order_id = %id, "payment recorded");
            Ok(redirect_success(&back, "Payment recorded"))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_error(
            &back,
            "Only orders awaiting payment can be marked as paid",
        )),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_is_lenient() {
        assert_eq!(parse_status_filter(Some("shipped")), Some(OrderStatus::Shipped));
        assert_eq!(parse_status_filter(Some("")), None);
        assert_eq!(parse_status_filter(Some("LOST")), None);
        assert_eq!(parse_status_filter(None), None);
    }

    #[test]
    fn test_status_tabs_keep_search() {
        let tabs = status_tabs(Some(OrderStatus::Pending), "ayşe");
        assert_eq!(tabs.len(), OrderStatus::ALL.len() + 1);
        assert_eq!(tabs.first().map(|t| t.url.as_str()), Some("/orders?q=ay%C5%9Fe"));
        let pending = tabs.iter().find(|t| t.active);
        assert_eq!(
            pending.map(|t| t.url.as_str()),
            Some("/orders?status=PENDING&q=ay%C5%9Fe")
        );
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(status_class(OrderStatus::Cancelled), "cancelled");
        assert_eq!(payment_class(PaymentStatus::Failed), "failed");
    }
}
