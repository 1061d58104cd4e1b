//! Order confirmation and tracking route handlers.
//!
//! Orders are reached through their unguessable tracking token, so guests
//! can follow an order without an account.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use solera_core::{OrderStatus, StepState, TrackingToken};
use solera_db::OrderRepository;
use solera_db::models::OrderDetail;

use crate::error::{AppError, Result};
use crate::filters;
use crate::page::PageContext;
use crate::state::AppState;

/// Order line display data.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub name: String,
    pub variant_label: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

/// Timeline entry.
#[derive(Debug, Clone)]
pub struct TimelineView {
    pub label: &'static str,
    pub state: &'static str,
}

/// Status change shown under the timeline.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub label: &'static str,
    pub note: Option<String>,
    pub at: String,
}

/// Order display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub order_number: String,
    pub placed_at: String,
    pub status: &'static str,
    pub is_closed: bool,
    pub payment_method: &'static str,
    pub payment_status: &'static str,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub items: Vec<OrderItemView>,
    pub subtotal: String,
    pub discount: Option<String>,
    pub shipping: String,
    pub total: String,
    pub coupon_code: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub timeline: Vec<TimelineView>,
    pub history: Vec<HistoryView>,
}

const fn step_state(state: StepState) -> &'static str {
    match state {
        StepState::Done => "done",
        StepState::Current => "current",
        StepState::Upcoming => "upcoming",
    }
}

impl From<&OrderDetail> for OrderView {
    fn from(detail: &OrderDetail) -> Self {
        let order = &detail.order;
        let currency = order.currency();
        let price = |amount| filters::price(amount, currency);

        let mut address = format!("{}, {} / {}", order.address_line, order.district, order.city);
        if !order.postal_code.is_empty() {
            address.push(' ');
            address.push_str(&order.postal_code);
        }

        Self {
            order_number: order.order_number.clone(),
            placed_at: filters::datetime(order.created_at),
            status: order.status.label(),
            is_closed: matches!(
                order.status,
                OrderStatus::Cancelled | OrderStatus::Refunded
            ),
            payment_method: order.payment_method.label(),
            payment_status: order.payment_status.label(),
            full_name: order.full_name.clone(),
            email: order.email.clone(),
            address,
            items: detail
                .items
                .iter()
                .map(|item| OrderItemView {
                    name: item.product_name.clone(),
                    variant_label: format!("{} / {}", item.color, item.size),
                    sku: item.sku.clone(),
                    quantity: item.quantity,
                    unit_price: price(item.unit_price),
                    line_total: price(item.line_total),
                })
                .collect(),
            subtotal: price(order.subtotal),
            discount: (!order.discount.is_zero()).then(|| price(order.discount)),
            shipping: if order.shipping.is_zero() {
                "Free".to_string()
            } else {
                price(order.shipping)
            },
            total: price(order.total),
            coupon_code: order.coupon_code.clone(),
            carrier: order.carrier.clone(),
            tracking_number: order.tracking_number.clone(),
            timeline: order
                .status
                .timeline()
                .into_iter()
                .map(|step| TimelineView {
                    label: step.status.label(),
                    state: step_state(step.state),
                })
                .collect(),
            history: detail
                .history
                .iter()
                .map(|h| HistoryView {
                    label: h.status.label(),
                    note: h.note.clone(),
                    at: filters::datetime(h.created_at),
                })
                .collect(),
        }
    }
}

/// Order page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub ctx: PageContext,
    pub order: OrderView,
}

/// Tracking lookup template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/track.html")]
pub struct TrackTemplate {
    pub ctx: PageContext,
    pub order_number: String,
    pub email: String,
    pub error: Option<String>,
}

/// Load an order by a token taken from the URL.
///
/// # Errors
///
/// Returns `NotFound` for malformed or unknown tokens.
pub async fn find_by_token(state: &AppState, token: &str) -> Result<OrderDetail> {
    let not_found = || AppError::NotFound("Order not found".to_string());
    let token = TrackingToken::parse(token).map_err(|_| not_found())?;
    OrderRepository::new(state.pool())
        .get_by_tracking_token(&token)
        .await?
        .ok_or_else(not_found)
}

/// Display an order with its tracking timeline.
#[instrument(skip(state, ctx, token))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    let detail = find_by_token(&state, &token).await?;
    Ok(OrderShowTemplate {
        ctx,
        order: OrderView::from(&detail),
    })
}

/// Display the tracking lookup form.
#[instrument(skip(ctx))]
pub async fn track_page(ctx: PageContext) -> impl IntoResponse {
    TrackTemplate {
        ctx,
        order_number: String::new(),
        email: String::new(),
        error: None,
    }
}

/// Tracking lookup form data.
#[derive(Debug, Deserialize)]
pub struct TrackForm {
    pub order_number: String,
    pub email: String,
}

/// Look up an order by number and email and redirect to its page.
#[instrument(skip(state, ctx, form))]
pub async fn track(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<TrackForm>,
) -> Result<Response> {
    let token = OrderRepository::new(state.pool())
        .find_tracking_token(&form.order_number, &form.email)
        .await?;

    match token {
        Some(token) => Ok(Redirect::to(&format!("/orders/{}", token.as_str())).into_response()),
        None => Ok(TrackTemplate {
            ctx,
            order_number: form.order_number,
            email: form.email,
            error: Some("No order matches that number and email address".to_string()),
        }
        .into_response()),
    }
}
