//! Cart pricing: line totals, coupon rules and shipping.
//!
//! Everything here is pure so the storefront cart, the checkout review page
//! and order placement compute identical totals from identical inputs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::money::round_to_cents;
use crate::types::{CouponKind, VariantId};

/// One priced cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub variant_id: VariantId,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Why a coupon does not apply to a cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CouponError {
    #[error("coupon not found")]
    NotFound,
    #[error("this coupon is no longer active")]
    Inactive,
    #[error("this coupon is not valid yet")]
    NotStarted,
    #[error("this coupon has expired")]
    Expired,
    #[error("this coupon has reached its usage limit")]
    UsageLimitReached,
    #[error("a minimum order of {minimum} is required for this coupon")]
    BelowMinimum { minimum: Decimal },
}

/// The parts of a stored coupon that decide whether and how much it discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRule {
    pub code: String,
    pub kind: CouponKind,
    /// Percentage (0-100] or fixed amount depending on `kind`.
    pub value: Decimal,
    pub min_subtotal: Option<Decimal>,
    /// Upper bound for percentage discounts.
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl CouponRule {
    /// Check whether the coupon can be applied to `subtotal` at `now`.
    ///
    /// # Errors
    ///
    /// Returns the first failing condition, checked in the order: active
    /// flag, start date, end date, usage limit, minimum subtotal.
    pub fn check(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<(), CouponError> {
        if !self.is_active {
            return Err(CouponError::Inactive);
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return Err(CouponError::NotStarted);
        }
        if self.ends_at.is_some_and(|end| now > end) {
            return Err(CouponError::Expired);
        }
        if self
            .usage_limit
            .is_some_and(|limit| self.used_count >= limit)
        {
            return Err(CouponError::UsageLimitReached);
        }
        if let Some(minimum) = self.min_subtotal
            && subtotal < minimum
        {
            return Err(CouponError::BelowMinimum { minimum });
        }
        Ok(())
    }

    /// Discount this coupon gives on `subtotal`, ignoring validity.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let raw = match self.kind {
            CouponKind::Percentage => {
                let pct = subtotal * self.value / Decimal::ONE_HUNDRED;
                self.max_discount.map_or(pct, |cap| pct.min(cap))
            }
            CouponKind::Fixed => self.value.min(subtotal),
        };
        round_to_cents(raw.max(Decimal::ZERO)).min(subtotal)
    }
}

/// Flat-rate shipping with an optional free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub flat_rate: Decimal,
    pub free_threshold: Option<Decimal>,
}

impl ShippingPolicy {
    /// Shipping charged for a cart whose discounted merchandise total is
    /// `discounted_subtotal`.
    #[must_use]
    pub fn shipping_for(&self, discounted_subtotal: Decimal, item_count: u32) -> Decimal {
        if item_count == 0 {
            return Decimal::ZERO;
        }
        match self.free_threshold {
            Some(threshold) if discounted_subtotal >= threshold => Decimal::ZERO,
            _ => self.flat_rate,
        }
    }

    /// Amount still needed to qualify for free shipping, if any.
    #[must_use]
    pub fn remaining_for_free(&self, discounted_subtotal: Decimal) -> Option<Decimal> {
        self.free_threshold
            .map(|threshold| threshold - discounted_subtotal)
            .filter(|remaining| *remaining > Decimal::ZERO)
    }
}

/// Computed totals for a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub item_count: u32,
    /// Set when a coupon was supplied but does not apply.
    pub coupon_error: Option<CouponError>,
}

/// Price a cart.
///
/// An invalid coupon contributes no discount; the reason is reported in
/// [`CartTotals::coupon_error`] so the cart can show it.
#[must_use]
pub fn price_cart(
    items: &[LineItem],
    coupon: Option<&CouponRule>,
    shipping: &ShippingPolicy,
    now: DateTime<Utc>,
) -> CartTotals {
    let subtotal = round_to_cents(items.iter().map(LineItem::line_total).sum());
    let item_count = items.iter().map(|item| item.quantity).sum();

    let (discount, coupon_error) = match coupon {
        None => (Decimal::ZERO, None),
        Some(rule) => match rule.check(subtotal, now) {
            Ok(()) => (rule.discount_for(subtotal), None),
            Err(err) => (Decimal::ZERO, Some(err)),
        },
    };

    let shipping = shipping.shipping_for(subtotal - discount, item_count);
    let total = (subtotal - discount + shipping).max(Decimal::ZERO);

    CartTotals {
        subtotal,
        discount,
        shipping,
        total,
        item_count,
        coupon_error,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(id: i32, price: &str, qty: u32) -> LineItem {
        LineItem {
            variant_id: VariantId::new(id),
            unit_price: dec(price),
            quantity: qty,
        }
    }

    fn coupon(kind: CouponKind, value: &str) -> CouponRule {
        CouponRule {
            code: "YAZ10".to_string(),
            kind,
            value: dec(value),
            min_subtotal: None,
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            starts_at: None,
            ends_at: None,
            is_active: true,
        }
    }

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            flat_rate: dec("49.90"),
            free_threshold: Some(dec("1000")),
        }
    }

    #[test]
    fn test_empty_cart_costs_nothing() {
        let totals = price_cart(&[], None, &policy(), now());
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn test_flat_shipping_below_threshold() {
        let totals = price_cart(&[item(1, "450", 2)], None, &policy(), now());
        assert_eq!(totals.subtotal, dec("900"));
        assert_eq!(totals.shipping, dec("49.90"));
        assert_eq!(totals.total, dec("949.90"));
        assert_eq!(totals.item_count, 2);
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        let totals = price_cart(&[item(1, "500", 2)], None, &policy(), now());
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dec("1000"));
    }

    #[test]
    fn test_discount_can_drop_cart_below_free_shipping() {
        let rule = coupon(CouponKind::Percentage, "10");
        let totals = price_cart(&[item(1, "500", 2)], Some(&rule), &policy(), now());
        assert_eq!(totals.discount, dec("100"));
        assert_eq!(totals.shipping, dec("49.90"));
        assert_eq!(totals.total, dec("949.90"));
    }

    #[test]
    fn test_percentage_discount_is_capped() {
        let mut rule = coupon(CouponKind::Percentage, "50");
        rule.max_discount = Some(dec("150"));
        assert_eq!(rule.discount_for(dec("1000")), dec("150"));
    }

    #[test]
    fn test_percentage_discount_rounds_to_cents() {
        let rule = coupon(CouponKind::Percentage, "15");
        assert_eq!(rule.discount_for(dec("99.99")), dec("15.00"));
    }

    #[test]
    fn test_fixed_discount_never_exceeds_subtotal() {
        let rule = coupon(CouponKind::Fixed, "300");
        assert_eq!(rule.discount_for(dec("250")), dec("250"));
        let totals = price_cart(&[item(1, "250", 1)], Some(&rule), &policy(), now());
        assert_eq!(totals.discount, dec("250"));
        assert_eq!(totals.total, dec("49.90"));
    }

    #[test]
    fn test_check_order_of_failures() {
        let mut rule = coupon(CouponKind::Fixed, "50");
        rule.is_active = false;
        rule.ends_at = Some(now() - chrono::Duration::days(1));
        assert_eq!(rule.check(dec("10"), now()), Err(CouponError::Inactive));

        rule.is_active = true;
        assert_eq!(rule.check(dec("10"), now()), Err(CouponError::Expired));

        rule.ends_at = None;
        rule.starts_at = Some(now() + chrono::Duration::days(1));
        assert_eq!(rule.check(dec("10"), now()), Err(CouponError::NotStarted));

        rule.starts_at = None;
        rule.usage_limit = Some(5);
        rule.used_count = 5;
        assert_eq!(
            rule.check(dec("10"), now()),
            Err(CouponError::UsageLimitReached)
        );

        rule.usage_limit = None;
        rule.min_subtotal = Some(dec("500"));
        assert_eq!(
            rule.check(dec("10"), now()),
            Err(CouponError::BelowMinimum {
                minimum: dec("500")
            })
        );
        assert_eq!(rule.check(dec("500"), now()), Ok(()));
    }

    #[test]
    fn test_invalid_coupon_reports_error_without_discount() {
        let mut rule = coupon(CouponKind::Percentage, "20");
        rule.min_subtotal = Some(dec("2000"));
        let totals = price_cart(&[item(1, "400", 1)], Some(&rule), &policy(), now());
        assert_eq!(totals.discount, Decimal::ZERO);
        assert!(matches!(
            totals.coupon_error,
            Some(CouponError::BelowMinimum { .. })
        ));
        assert_eq!(totals.total, dec("449.90"));
    }

    #[test]
    fn test_remaining_for_free_shipping() {
        assert_eq!(policy().remaining_for_free(dec("800")), Some(dec("200")));
        assert_eq!(policy().remaining_for_free(dec("1200")), None);
    }
}
