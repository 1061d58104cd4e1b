//! Order API: JSON order creation and tracking.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use solera_core::checkout::{ContactDetails, FieldError, ShippingAddress};
use solera_core::{OrderStatus, PaymentMethod, PaymentStatus, StepState, VariantId};
use solera_db::OrderRepository;
use solera_db::models::{NewOrder, NewOrderLine, OrderDetail};

use crate::error::AppError;
use crate::middleware::OptionalUser;
use crate::routes::api::ApiError;
use crate::routes::orders::find_by_token;
use crate::services::cart::MAX_LINE_QUANTITY;
use crate::services::checkout;
use crate::services::locations::Locations;
use crate::state::AppState;

/// Most distinct lines accepted in one order.
const MAX_ITEMS: usize = 50;

/// One requested line.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub variant_id: i32,
    pub quantity: u32,
}

/// POST /api/orders body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub contact: ContactDetails,
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

impl CreateOrderRequest {
    /// Requested lines with repeated variants folded together, in first-seen
    /// order. The per-variant cap applies to these totals.
    fn merged_items(&self) -> Vec<(VariantId, u32)> {
        let mut merged: Vec<(VariantId, u32)> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let id = VariantId::new(item.variant_id);
            match merged.iter_mut().find(|(seen, _)| *seen == id) {
                Some((_, qty)) => *qty = qty.saturating_add(item.quantity),
                None => merged.push((id, item.quantity)),
            }
        }
        merged
    }

    /// Check the request body before touching the database.
    fn validate(&self, locations: &Locations) -> Result<(), Vec<FieldError>> {
        let mut errors = self.contact.validate().err().unwrap_or_default();
        if let Err(address) = checkout::validate_address(&self.shipping, locations) {
            errors.extend(address);
        }
        if self.items.is_empty() {
            errors.push(FieldError {
                field: "items",
                message: "at least one item is required".to_string(),
            });
        } else if self.items.len() > MAX_ITEMS {
            errors.push(FieldError {
                field: "items",
                message: format!("at most {MAX_ITEMS} items per order"),
            });
        }
        if self.items.iter().any(|i| i.quantity == 0)
            || self
                .merged_items()
                .iter()
                .any(|(_, qty)| *qty > MAX_LINE_QUANTITY)
        {
            errors.push(FieldError {
                field: "quantity",
                message: format!("quantity must be between 1 and {MAX_LINE_QUANTITY}"),
            });
        }
        if self.note.as_deref().is_some_and(|n| n.chars().count() > 500) {
            errors.push(FieldError {
                field: "note",
                message: "note must be at most 500 characters".to_string(),
            });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// POST /api/orders response.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_number: String,
    pub tracking_token: String,
    pub total: Decimal,
    pub currency: &'static str,
    pub url: String,
}

/// Create an order from a JSON body.
///
/// POST /api/orders
///
/// Prices, stock and the coupon are checked against the database; the
/// client only names variants and quantities.
#[instrument(skip(state, user, req), fields(items = req.items.len()))]
pub async fn create(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    req.validate(state.locations())
        .map_err(|errors| ApiError::from(AppError::Validation(errors)))?;

    let settings = state.settings().await?;

    let lines = req
        .merged_items()
        .into_iter()
        .map(|(variant_id, quantity)| NewOrderLine {
            variant_id,
            quantity,
        })
        .collect();
    let order = NewOrder {
        user_id: user.map(|u| u.id),
        contact: req.contact,
        address: req.shipping,
        payment_method: req.payment_method,
        note: req.note,
        lines,
        coupon_code: req.coupon_code.filter(|c| !c.trim().is_empty()),
        shipping: settings.shipping_policy(),
        currency: settings.currency,
    };

    let placed = OrderRepository::new(state.pool()).place(&order).await?;
    tracing::info!(order_number = %placed.order_number, "order created via api");

    let token = placed.tracking_token.as_str().to_string();
    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_number: placed.order_number,
            url: format!("/orders/{token}"),
            tracking_token: token,
            total: placed.total,
            currency: settings.currency.code(),
        }),
    ))
}

/// Timeline step in the tracking response.
#[derive(Debug, Serialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub label: &'static str,
    pub state: StepState,
}

/// Order line in the tracking response.
#[derive(Debug, Serialize)]
pub struct TrackedItem {
    pub product_name: String,
    pub sku: String,
    pub size: String,
    pub color: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// GET /api/orders/{token} response.
#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub order_number: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub items: Vec<TrackedItem>,
    pub timeline: Vec<TimelineEntry>,
}

impl From<OrderDetail> for TrackingResponse {
    fn from(detail: OrderDetail) -> Self {
        let order = detail.order;
        Self {
            status_label: order.status.label(),
            timeline: order
                .status
                .timeline()
                .into_iter()
                .map(|step| TimelineEntry {
                    status: step.status,
                    label: step.status.label(),
                    state: step.state,
                })
                .collect(),
            items: detail
                .items
                .into_iter()
                .map(|i| TrackedItem {
                    product_name: i.product_name,
                    sku: i.sku,
                    size: i.size,
                    color: i.color,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    line_total: i.line_total,
                })
                .collect(),
            order_number: order.order_number,
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            subtotal: order.subtotal,
            discount: order.discount,
            shipping: order.shipping,
            total: order.total,
            currency: order.currency,
            carrier: order.carrier,
            tracking_number: order.tracking_number,
            created_at: order.created_at,
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
        }
    }
}

/// Order status and timeline as JSON.
///
/// GET /api/orders/{token}
#[instrument(skip(state, token))]
pub async fn show(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let detail = find_by_token(&state, &token).await?;
    Ok(Json(TrackingResponse::from(detail)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: &str) -> CreateOrderRequest {
        serde_json::from_str(json).unwrap()
    }

    const VALID: &str = r#"{
        "contact": {"email": "mehmet@example.com", "full_name": "Mehmet Kaya", "phone": "05551234567"},
        "shipping": {"city": "Muğla", "district": "Bodrum", "address_line": "Neyzen Tevfik Cd. 5", "postal_code": "48400"},
        "payment_method": "cash_on_delivery",
        "items": [{"variant_id": 3, "quantity": 2}]
    }"#;

    #[test]
    fn test_valid_request_passes() {
        let locations = Locations::bundled().unwrap();
        let req = request(VALID);
        assert_eq!(req.payment_method, PaymentMethod::CashOnDelivery);
        assert!(req.validate(&locations).is_ok());
    }

    #[test]
    fn test_rejects_bad_quantity_and_district() {
        let locations = Locations::bundled().unwrap();
        let mut req = request(VALID);
        req.items[0].quantity = 11;
        req.shipping.district = "Kadıköy".to_string();

        let fields: Vec<&str> = req
            .validate(&locations)
            .unwrap_err()
            .iter()
            .map(|e| e.field)
            .collect();
        assert!(fields.contains(&"quantity"));
        assert!(fields.contains(&"district"));
    }

    #[test]
    fn test_rejects_empty_items() {
        let locations = Locations::bundled().unwrap();
        let mut req = request(VALID);
        req.items.clear();
        let errors = req.validate(&locations).unwrap_err();
        assert_eq!(errors[0].field, "items");
    }

    #[test]
    fn test_repeated_variant_counts_against_one_cap() {
        let locations = Locations::bundled().unwrap();
        let mut req = request(VALID);
        req.items = (0..50)
            .map(|_| OrderItemRequest {
                variant_id: 3,
                quantity: 10,
            })
            .collect();

        assert_eq!(req.merged_items(), vec![(VariantId::new(3), 500)]);
        let fields: Vec<&str> = req
            .validate(&locations)
            .unwrap_err()
            .iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["quantity"]);
    }

    #[test]
    fn test_repeated_variant_within_cap_is_merged() {
        let locations = Locations::bundled().unwrap();
        let mut req = request(VALID);
        req.items.push(OrderItemRequest {
            variant_id: 8,
            quantity: 1,
        });
        req.items.push(OrderItemRequest {
            variant_id: 3,
            quantity: 4,
        });

        assert!(req.validate(&locations).is_ok());
        assert_eq!(
            req.merged_items(),
            vec![(VariantId::new(3), 6), (VariantId::new(8), 1)]
        );
    }
}
