//! Session cart.
//!
//! The session holds only variant IDs and quantities. Every render re-reads
//! prices and stock from the database and re-evaluates the applied coupon,
//! so totals never go stale.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_sessions::Session;

use solera_core::pricing::{CartTotals, CouponError, CouponRule, LineItem, price_cart};
use solera_core::{CurrencyCode, VariantId};
use solera_db::models::{CartVariant, NewOrderLine, StoreSettings};
use solera_db::{CouponRepository, ProductRepository, RepositoryError};

use crate::models::session_keys;

/// Upper bound on the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// One cart line as stored in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// The customer's cart as stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCart {
    pub lines: Vec<CartLine>,
}

const fn clamp_quantity(quantity: u32) -> u32 {
    if quantity < 1 {
        1
    } else if quantity > MAX_LINE_QUANTITY {
        MAX_LINE_QUANTITY
    } else {
        quantity
    }
}

impl SessionCart {
    /// Load the cart from the session; a missing or unreadable entry is an
    /// empty cart.
    pub async fn load(session: &Session) -> Self {
        session
            .get::<Self>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Store the cart in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::CART, self).await
    }

    /// Remove the cart from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(session_keys::CART).await?;
        Ok(())
    }

    /// Add a variant. Adding one already in the cart increases its quantity.
    pub fn add(&mut self, variant_id: VariantId, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant_id) {
            line.quantity = clamp_quantity(line.quantity.saturating_add(quantity));
        } else {
            self.lines.push(CartLine {
                variant_id,
                quantity: clamp_quantity(quantity),
            });
        }
    }

    /// Set a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, variant_id: VariantId, quantity: u32) {
        if quantity == 0 {
            self.remove(variant_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.variant_id == variant_id) {
            line.quantity = clamp_quantity(quantity);
        }
    }

    pub fn remove(&mut self, variant_id: VariantId) {
        self.lines.retain(|l| l.variant_id != variant_id);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of pairs in the cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn variant_ids(&self) -> Vec<VariantId> {
        self.lines.iter().map(|l| l.variant_id).collect()
    }

    /// Lines for order placement.
    #[must_use]
    pub fn order_lines(&self) -> Vec<NewOrderLine> {
        self.lines
            .iter()
            .map(|l| NewOrderLine {
                variant_id: l.variant_id,
                quantity: l.quantity,
            })
            .collect()
    }

    /// Drop lines whose variant is no longer purchasable.
    ///
    /// Returns `true` if anything was removed.
    pub fn retain_available(&mut self, available: &[VariantId]) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| available.contains(&l.variant_id));
        self.lines.len() != before
    }
}

/// The applied coupon code, if any.
pub async fn coupon_code(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::COUPON_CODE)
        .await
        .ok()
        .flatten()
}

/// Remember a coupon code for this cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn set_coupon_code(
    session: &Session,
    code: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::COUPON_CODE, code).await
}

/// Forget the applied coupon.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn clear_coupon_code(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(session_keys::COUPON_CODE).await?;
    Ok(())
}

/// A cart line joined with current catalog data.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub variant: CartVariant,
    pub quantity: u32,
    pub line_total: Decimal,
    /// More pairs requested than are in stock.
    pub exceeds_stock: bool,
}

/// A fully priced cart.
#[derive(Debug, Clone, Serialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub totals: CartTotals,
    pub coupon_code: Option<String>,
    pub currency: CurrencyCode,
    /// How much more to spend for free shipping, when a threshold applies.
    pub free_shipping_remaining: Option<Decimal>,
}

impl PricedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First line asking for more than is in stock.
    #[must_use]
    pub fn first_shortage(&self) -> Option<&PricedLine> {
        self.lines.iter().find(|l| l.exceeds_stock)
    }
}

/// Price cart lines against catalog rows and an optional coupon.
///
/// Lines without a matching variant are skipped. `coupon` is `None` when no
/// code is applied, `Some(None)` when a code is applied but unknown.
#[must_use]
pub fn assemble(
    cart: &SessionCart,
    variants: &[CartVariant],
    coupon: Option<(&str, Option<&CouponRule>)>,
    settings: &StoreSettings,
    now: DateTime<Utc>,
) -> PricedCart {
    let lines: Vec<PricedLine> = cart
        .lines
        .iter()
        .filter_map(|line| {
            let variant = variants.iter().find(|v| v.variant_id == line.variant_id)?;
            Some(PricedLine {
                variant: variant.clone(),
                quantity: line.quantity,
                line_total: variant.unit_price * Decimal::from(line.quantity),
                exceeds_stock: i64::from(line.quantity) > i64::from(variant.stock),
            })
        })
        .collect();

    let items: Vec<LineItem> = lines
        .iter()
        .map(|l| LineItem {
            variant_id: l.variant.variant_id,
            unit_price: l.variant.unit_price,
            quantity: l.quantity,
        })
        .collect();

    let policy = settings.shipping_policy();
    let rule = coupon.and_then(|(_, rule)| rule);
    let mut totals = price_cart(&items, rule, &policy, now);
    if let Some((_, None)) = coupon {
        totals.coupon_error = Some(CouponError::NotFound);
    }

    let free_shipping_remaining = if items.is_empty() {
        None
    } else {
        policy.remaining_for_free(totals.subtotal - totals.discount)
    };

    PricedCart {
        lines,
        totals,
        coupon_code: coupon.map(|(code, _)| code.to_string()),
        currency: settings.currency,
        free_shipping_remaining,
    }
}

/// Load catalog data for the session cart and price it.
///
/// Lines whose variant disappeared from the catalog are dropped from `cart`;
/// the caller decides whether to persist that.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
#[tracing::instrument(skip_all, fields(lines = cart.lines.len()))]
pub async fn price(
    pool: &PgPool,
    cart: &mut SessionCart,
    coupon_code: Option<&str>,
    settings: &StoreSettings,
) -> Result<PricedCart, RepositoryError> {
    let variants = if cart.is_empty() {
        Vec::new()
    } else {
        ProductRepository::new(pool)
            .cart_variants(&cart.variant_ids())
            .await?
    };
    let available: Vec<VariantId> = variants.iter().map(|v| v.variant_id).collect();
    if cart.retain_available(&available) {
        tracing::debug!("dropped unavailable variants from cart");
    }

    let coupon = match coupon_code {
        Some(code) => CouponRepository::new(pool)
            .get_by_code(code)
            .await?
            .map(|c| c.rule()),
        None => None,
    };
    let applied = coupon_code.map(|code| (code, coupon.as_ref()));

    Ok(assemble(cart, &variants, applied, settings, Utc::now()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use solera_core::{CouponKind, Gender, ProductId};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn variant(id: i32, price: &str, stock: i32) -> CartVariant {
        CartVariant {
            variant_id: VariantId::new(id),
            product_id: ProductId::new(1),
            gender: Gender::Women,
            slug: "bodrum".to_string(),
            product_name: "Bodrum".to_string(),
            sku: format!("BDR-{id}"),
            size: "38".to_string(),
            color: "Taba".to_string(),
            unit_price: dec(price),
            stock,
            image_url: None,
        }
    }

    fn rule(min: Option<&str>) -> CouponRule {
        CouponRule {
            code: "YAZ10".to_string(),
            kind: CouponKind::Percentage,
            value: dec("10"),
            min_subtotal: min.map(dec),
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            starts_at: None,
            ends_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_add_merges_and_clamps() {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(1), 2);
        cart.add(VariantId::new(1), 3);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count(), 5);

        cart.add(VariantId::new(1), 50);
        assert_eq!(cart.lines[0].quantity, MAX_LINE_QUANTITY);

        cart.add(VariantId::new(2), 0);
        assert_eq!(cart.lines[1].quantity, 1);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(1), 2);
        cart.set_quantity(VariantId::new(1), 11);
        assert_eq!(cart.lines[0].quantity, MAX_LINE_QUANTITY);
        cart.set_quantity(VariantId::new(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_ignores_unknown_variant() {
        let mut cart = SessionCart::default();
        cart.set_quantity(VariantId::new(9), 3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_retain_available() {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(1), 1);
        cart.add(VariantId::new(2), 1);
        assert!(cart.retain_available(&[VariantId::new(2)]));
        assert_eq!(cart.variant_ids(), vec![VariantId::new(2)]);
        assert!(!cart.retain_available(&[VariantId::new(2)]));
    }

    #[test]
    fn test_total_is_lines_minus_discount_plus_shipping() {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(1), 2);
        cart.add(VariantId::new(2), 1);
        let variants = [variant(1, "450", 5), variant(2, "300", 5)];
        let settings = StoreSettings::default();

        let priced = assemble(
            &cart,
            &variants,
            Some(("YAZ10", Some(&rule(None)))),
            &settings,
            Utc::now(),
        );

        let t = &priced.totals;
        assert_eq!(t.subtotal, dec("1200"));
        assert_eq!(t.discount, dec("120"));
        assert_eq!(t.shipping, settings.flat_shipping_rate);
        assert_eq!(t.total, t.subtotal - t.discount + t.shipping);
        assert_eq!(priced.coupon_code.as_deref(), Some("YAZ10"));
    }

    #[test]
    fn test_coupon_below_minimum_reports_reason() {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(1), 1);
        let priced = assemble(
            &cart,
            &[variant(1, "450", 5)],
            Some(("YAZ10", Some(&rule(Some("1000"))))),
            &StoreSettings::default(),
            Utc::now(),
        );
        assert_eq!(priced.totals.discount, Decimal::ZERO);
        assert_eq!(
            priced.totals.coupon_error,
            Some(CouponError::BelowMinimum {
                minimum: dec("1000")
            })
        );
    }

    #[test]
    fn test_unknown_coupon_reports_not_found() {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(1), 1);
        let priced = assemble(
            &cart,
            &[variant(1, "450", 5)],
            Some(("NOPE", None)),
            &StoreSettings::default(),
            Utc::now(),
        );
        assert_eq!(priced.totals.coupon_error, Some(CouponError::NotFound));
    }

    #[test]
    fn test_shortage_detected() {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(1), 3);
        let priced = assemble(
            &cart,
            &[variant(1, "450", 2)],
            None,
            &StoreSettings::default(),
            Utc::now(),
        );
        assert_eq!(
            priced.first_shortage().map(|l| l.variant.sku.as_str()),
            Some("BDR-1")
        );
    }

    #[test]
    fn test_free_shipping_remaining() {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(1), 1);
        let priced = assemble(
            &cart,
            &[variant(1, "1000", 5)],
            None,
            &StoreSettings::default(),
            Utc::now(),
        );
        assert_eq!(priced.free_shipping_remaining, Some(dec("500")));
    }
}
