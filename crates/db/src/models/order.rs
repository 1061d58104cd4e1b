//! Order, coupon and status-history types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use solera_core::checkout::{ContactDetails, ShippingAddress};
use solera_core::pricing::{CouponError, CouponRule, ShippingPolicy};
use solera_core::{
    CouponId, CouponKind, CurrencyCode, OrderId, OrderItemId, OrderStatus, PaymentMethod,
    PaymentStatus, TrackingToken, TransitionError, UserId, VariantId,
};

use crate::RepositoryError;

/// A stored coupon.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    pub min_subtotal: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// The pricing rule this coupon carries.
    #[must_use]
    pub fn rule(&self) -> CouponRule {
        CouponRule {
            code: self.code.clone(),
            kind: self.kind,
            value: self.value,
            min_subtotal: self.min_subtotal,
            max_discount: self.max_discount,
            usage_limit: self.usage_limit,
            used_count: self.used_count,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
        }
    }
}

/// Fields for creating or updating a coupon.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponInput {
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    pub min_subtotal: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub tracking_token: String,
    pub user_id: Option<UserId>,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub district: String,
    pub address_line: String,
    pub postal_code: String,
    pub note: Option<String>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub coupon_code: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Currency the order was placed in; unknown codes fall back to the default.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.currency.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// One row of an order's status history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub admin_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An order with its lines and history.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<StatusHistoryEntry>,
}

/// Order listing row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub tracking_token: String,
    pub full_name: String,
    pub email: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Decimal,
    pub currency: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One requested cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub contact: ContactDetails,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    pub lines: Vec<NewOrderLine>,
    pub coupon_code: Option<String>,
    pub shipping: ShippingPolicy,
    pub currency: CurrencyCode,
}

/// Result of a successful placement.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub order_number: String,
    pub tracking_token: TrackingToken,
    pub total: Decimal,
}

/// Errors from [`crate::OrderRepository::place`].
#[derive(Debug, thiserror::Error)]
pub enum PlaceOrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("variant {0} is no longer available")]
    VariantUnavailable(VariantId),

    #[error("only {available} left of {sku}")]
    OutOfStock { sku: String, available: i32 },

    #[error("coupon rejected: {0}")]
    Coupon(CouponError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Carrier details recorded when an order ships.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentInfo {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

/// Errors from [`crate::OrderRepository::update_status`].
#[derive(Debug, thiserror::Error)]
pub enum StatusUpdateError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for StatusUpdateError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct DashboardStats {
    pub orders_today: i64,
    pub revenue_today: Decimal,
    pub revenue_30d: Decimal,
    pub orders_30d: i64,
    pub pending_orders: i64,
    pub awaiting_payment: i64,
    pub customers: i64,
    pub active_products: i64,
}

/// Suffix width of an order number.
const ORDER_SEQ_MODULUS: i64 = 1_000_000;

/// Human-facing order number: `SL` + `yymmdd` + the last six digits of the
/// global order sequence. Always 14 characters.
///
/// The date prefix keeps numbers unique as long as fewer than a million
/// orders are placed in one day; the `UNIQUE` constraint on
/// `order_number` rejects anything past that.
#[must_use]
pub fn format_order_number(date: NaiveDate, seq: i64) -> String {
    let suffix = seq.rem_euclid(ORDER_SEQ_MODULUS);
    format!("SL{}{suffix:06}", date.format("%y%m%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 9).unwrap();
        assert_eq!(format_order_number(date, 42), "SL260509000042");
        assert_eq!(format_order_number(date, 999_999), "SL260509999999");
    }

    #[test]
    fn test_order_number_wraps_to_six_digits() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 9).unwrap();
        assert_eq!(format_order_number(date, 1_234_567), "SL260509234567");
        assert_eq!(format_order_number(date, 1_000_000), "SL260509000000");
        for seq in [1, 999_999, 1_000_001, 87_654_321] {
            assert_eq!(format_order_number(date, seq).len(), 14);
        }
    }

    #[test]
    fn test_coupon_rule_copies_limits() {
        let coupon = Coupon {
            id: CouponId::new(1),
            code: "HOSGELDIN".to_string(),
            kind: CouponKind::Fixed,
            value: Decimal::new(100, 0),
            min_subtotal: Some(Decimal::new(500, 0)),
            max_discount: None,
            usage_limit: Some(10),
            used_count: 3,
            starts_at: None,
            ends_at: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let rule = coupon.rule();
        assert_eq!(rule.code, "HOSGELDIN");
        assert_eq!(rule.usage_limit, Some(10));
        assert_eq!(rule.used_count, 3);
    }
}
