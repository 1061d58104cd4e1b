//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use solera_core::pagination::Page;
use solera_db::models::{DashboardStats, LowStockVariant};
use solera_db::{OrderRepository, ProductRepository, SettingsRepository};

use crate::{
    error::Result,
    filters,
    middleware::auth::RequireAdminAuth,
    models::CurrentAdmin,
    state::AppState,
};

use super::Notice;
use super::orders::OrderRow;

/// Recent orders shown on the dashboard.
const RECENT_ORDER_COUNT: u32 = 8;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub is_super_admin: bool,
    pub can_write: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            is_super_admin: admin.is_super_admin(),
            can_write: admin.can_write(),
        }
    }
}

/// Dashboard metrics, formatted for display.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub orders_today: i64,
    pub revenue_today: String,
    pub orders_30d: i64,
    pub revenue_30d: String,
    pub pending_orders: i64,
    pub awaiting_payment: i64,
    pub customers: i64,
    pub active_products: i64,
}

/// Low-stock row.
#[derive(Debug, Clone)]
pub struct LowStockView {
    pub product_url: String,
    pub product_name: String,
    pub sku: String,
    pub option: String,
    pub stock: i32,
}

impl From<&LowStockVariant> for LowStockView {
    fn from(variant: &LowStockVariant) -> Self {
        Self {
            product_url: format!("/products/{}", variant.product_id),
            product_name: variant.product_name.clone(),
            sku: variant.sku.clone(),
            option: format!("{} / {}", variant.color, variant.size),
            stock: variant.stock,
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<OrderRow>,
    pub low_stock: Vec<LowStockView>,
    pub low_stock_threshold: i32,
}

/// Dashboard page handler.
#[instrument(skip(admin, state))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(notice): Query<Notice>,
) -> Result<DashboardTemplate> {
    let settings = SettingsRepository::new(state.pool()).load().await?;
    let orders = OrderRepository::new(state.pool());
    let products = ProductRepository::new(state.pool());

    let (stats, recent, low_stock) = tokio::try_join!(
        orders.dashboard_stats(),
        orders.list(None, None, Page::new(Some(1), RECENT_ORDER_COUNT)),
        products.low_stock(settings.low_stock_threshold),
    )?;

    let DashboardStats {
        orders_today,
        revenue_today,
        revenue_30d,
        orders_30d,
        pending_orders,
        awaiting_payment,
        customers,
        active_products,
    } = stats;

    let metrics = DashboardMetrics {
        orders_today,
        revenue_today: filters::price(revenue_today, settings.currency),
        orders_30d,
        revenue_30d: filters::price(revenue_30d, settings.currency),
        pending_orders,
        awaiting_payment,
        customers,
        active_products,
    };

    let (success_message, error_message) = notice.into_messages();

    Ok(DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        success_message,
        error_message,
        metrics,
        recent_orders: recent.items.iter().map(OrderRow::from).collect(),
        low_stock: low_stock.iter().map(LowStockView::from).collect(),
        low_stock_threshold: settings.low_stock_threshold,
    })
}
