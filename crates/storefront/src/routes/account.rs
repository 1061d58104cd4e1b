//! Account route handlers.
//!
//! Every handler requires a logged-in customer via [`RequireUser`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use solera_db::models::OrderSummary;
use solera_db::{OrderRepository, UserRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireUser;
use crate::page::PageContext;
use crate::state::AppState;

/// Orders shown on the account overview.
const RECENT_ORDERS: usize = 3;

/// Order history row.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub order_number: String,
    pub url: String,
    pub placed_at: String,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub item_count: i64,
    pub total: String,
}

impl From<&OrderSummary> for OrderRow {
    fn from(order: &OrderSummary) -> Self {
        Self {
            order_number: order.order_number.clone(),
            url: format!("/orders/{}", order.tracking_token),
            placed_at: filters::date(order.created_at),
            status: order.status.label(),
            payment_status: order.payment_status.label(),
            item_count: order.item_count,
            total: filters::price(order.total, order.currency.parse().unwrap_or_default()),
        }
    }
}

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub ctx: PageContext,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub member_since: String,
    pub recent_orders: Vec<OrderRow>,
    pub order_count: usize,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct AccountOrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderRow>,
}

/// Display the account overview.
#[instrument(skip(state, user, ctx))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let users = UserRepository::new(state.pool());
    let order_repo = OrderRepository::new(state.pool());
    let (profile, orders) = tokio::try_join!(
        users.get_by_id(user.id),
        order_repo.list_for_user(user.id),
    )?;
    let profile = profile.ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

    Ok(AccountIndexTemplate {
        ctx,
        full_name: profile.full_name,
        email: profile.email.into_inner(),
        phone: profile.phone,
        member_since: filters::date(profile.created_at),
        recent_orders: orders.iter().take(RECENT_ORDERS).map(OrderRow::from).collect(),
        order_count: orders.len(),
    })
}

/// Display the customer's order history.
#[instrument(skip(state, user, ctx))]
pub async fn orders(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(AccountOrdersTemplate {
        ctx,
        orders: orders.iter().map(OrderRow::from).collect(),
    })
}
