//! Status enums for orders, payments, coupons and admin roles.
//!
//! # Order lifecycle
//!
//! ```text
//! Pending -> Confirmed -> Processing -> Shipped -> Delivered -> Refunded
//!    \           \             \
//!     +-----------+-------------+--> Cancelled
//! ```
//!
//! Forward moves along the main line may skip steps (an admin can mark a
//! pending order as shipped). Nothing moves backwards, and once an order is
//! delivered the only remaining move is a refund.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a status string does not name a known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Order fulfilment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

/// Error returned for a disallowed status change.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot move order from {from} to {to}")]
pub struct TransitionError {
    /// Status the order is currently in.
    pub from: OrderStatus,
    /// Requested status.
    pub to: OrderStatus,
}

/// Where a main-line step sits relative to the order's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Done,
    Current,
    Upcoming,
}

/// One entry of the customer-facing order timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub status: OrderStatus,
    pub state: StepState,
}

impl OrderStatus {
    /// Main-line statuses in fulfilment order.
    pub const LINE: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
    ];

    /// Every status, for admin filters.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
    ];

    /// Position on the main line, `None` for cancelled/refunded.
    #[must_use]
    pub const fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Processing => Some(2),
            Self::Shipped => Some(3),
            Self::Delivered => Some(4),
            Self::Cancelled | Self::Refunded => None,
        }
    }

    /// Whether an order in this status may move to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Cancelled | Self::Refunded, _) => false,
            (Self::Delivered, Self::Refunded) => true,
            (Self::Pending | Self::Confirmed | Self::Processing, Self::Cancelled) => true,
            (from, to) => match (from.rank(), to.rank()) {
                (Some(a), Some(b)) => b > a,
                _ => false,
            },
        }
    }

    /// Validate and perform a status change.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the move is not allowed.
    pub fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    /// Statuses reachable from this one, in display order.
    #[must_use]
    pub fn next_options(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|candidate| self.can_transition_to(*candidate))
            .collect()
    }

    /// Whether the order left the main line (cancelled or refunded).
    #[must_use]
    pub const fn is_terminal_alternate(self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }

    /// Whether moving into this status puts reserved stock back on the shelf.
    #[must_use]
    pub const fn releases_stock(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Main-line timeline for the tracking page.
    #[must_use]
    pub fn timeline(self) -> Vec<TimelineStep> {
        Self::LINE
            .into_iter()
            .map(|step| {
                let state = match (self, step.rank(), self.rank()) {
                    (Self::Refunded, _, _) => StepState::Done,
                    (Self::Cancelled, _, _) => StepState::Upcoming,
                    (_, Some(s), Some(c)) if s < c => StepState::Done,
                    (_, Some(s), Some(c)) if s == c => StepState::Current,
                    _ => StepState::Upcoming,
                };
                TimelineStep {
                    status: step,
                    state,
                }
            })
            .collect()
    }

    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Order received",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Being handmade",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseStatusError::new("order status", s))
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Order payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting payment",
            Self::Paid => "Paid",
            Self::Failed => "Payment failed",
            Self::Refunded => "Refunded",
        }
    }
}

/// How the customer pays.
///
/// Card payments go through an external gateway that is not wired up yet, so
/// every method starts out [`PaymentStatus::Pending`] and is settled by an
/// admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
    Card,
}

impl PaymentMethod {
    /// Every method, in the order shown at checkout.
    pub const ALL: [Self; 3] = [Self::Card, Self::BankTransfer, Self::CashOnDelivery];

    /// Payment status a new order starts with.
    #[must_use]
    pub const fn initial_payment_status(self) -> PaymentStatus {
        match self {
            Self::CashOnDelivery | Self::BankTransfer | Self::Card => PaymentStatus::Pending,
        }
    }

    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::BankTransfer => "bank_transfer",
            Self::Card => "card",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on delivery",
            Self::BankTransfer => "Bank transfer",
            Self::Card => "Credit / debit card",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ParseStatusError::new("payment method", s))
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// How a coupon's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.coupon_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// Value is a percentage (0-100] of the subtotal.
    Percentage,
    /// Value is an amount off the subtotal.
    Fixed,
}

impl CouponKind {
    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }
}

impl std::str::FromStr for CouponKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(ParseStatusError::new("coupon kind", other)),
        }
    }
}

// =============================================================================
// Admin Roles
// =============================================================================

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access including admin-user management.
    SuperAdmin,
    /// Full access to store management features.
    Admin,
    /// Read-only access to store data.
    Viewer,
}

impl AdminRole {
    /// Whether this role may change store data.
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(ParseStatusError::new("admin role", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_moves_allowed_including_skips() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_no_backward_or_self_moves() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Pending));
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_delivered_cannot_regress() {
        for status in OrderStatus::LINE {
            assert!(!OrderStatus::Delivered.can_transition_to(status));
        }
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert_eq!(
            OrderStatus::Delivered.next_options(),
            vec![OrderStatus::Refunded]
        );
    }

    #[test]
    fn test_cancellation_only_before_shipping() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_refund_only_after_delivery() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Refunded));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Refunded));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded));
    }

    #[test]
    fn test_terminal_alternates_are_final() {
        assert!(OrderStatus::Cancelled.next_options().is_empty());
        assert!(OrderStatus::Refunded.next_options().is_empty());
    }

    #[test]
    fn test_transition_error_reports_both_ends() {
        let err = OrderStatus::Shipped
            .transition(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(err.from, OrderStatus::Shipped);
        assert_eq!(err.to, OrderStatus::Pending);
        assert_eq!(err.to_string(), "cannot move order from SHIPPED to PENDING");
    }

    #[test]
    fn test_timeline_marks_current_step() {
        let states: Vec<StepState> = OrderStatus::Processing
            .timeline()
            .into_iter()
            .map(|s| s.state)
            .collect();
        assert_eq!(
            states,
            vec![
                StepState::Done,
                StepState::Done,
                StepState::Current,
                StepState::Upcoming,
                StepState::Upcoming,
            ]
        );
    }

    #[test]
    fn test_timeline_for_alternates() {
        assert!(
            OrderStatus::Refunded
                .timeline()
                .iter()
                .all(|s| s.state == StepState::Done)
        );
        assert!(
            OrderStatus::Cancelled
                .timeline()
                .iter()
                .all(|s| s.state == StepState::Upcoming)
        );
    }

    #[test]
    fn test_order_status_parse_and_serde_agree() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            "shipped".parse::<OrderStatus>().unwrap(),
            OrderStatus::Shipped
        );
        assert!("LOST".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_round_trip() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
            assert_eq!(method.initial_payment_status(), PaymentStatus::Pending);
        }
    }

    #[test]
    fn test_admin_role_permissions() {
        assert!(AdminRole::SuperAdmin.can_write());
        assert!(AdminRole::Admin.can_write());
        assert!(!AdminRole::Viewer.can_write());
        assert_eq!("viewer".parse::<AdminRole>().unwrap(), AdminRole::Viewer);
        assert_eq!(AdminRole::SuperAdmin.to_string(), "super_admin");
    }
}
