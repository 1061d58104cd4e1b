//! Cart route handlers.
//!
//! Cart operations answer HTMX requests with fragments and plain form posts
//! with a redirect back to the cart. The session holds only variant IDs and
//! quantities; every render re-prices from the database.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use solera_core::VariantId;
use solera_db::ProductRepository;
use solera_db::repos::normalize_coupon_code;

use crate::error::{AppError, Result};
use crate::filters;
use crate::models::Flash;
use crate::page::PageContext;
use crate::routes::is_htmx;
use crate::services::cart::{self, MAX_LINE_QUANTITY, PricedCart, PricedLine, SessionCart};
use crate::services::flash;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub variant_id: i32,
    pub name: String,
    pub url: String,
    pub variant_label: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub stock_note: Option<String>,
}

impl CartLineView {
    fn new(line: &PricedLine, cart: &PricedCart) -> Self {
        let v = &line.variant;
        Self {
            variant_id: v.variant_id.as_i32(),
            name: v.product_name.clone(),
            url: format!("/shop/{}/{}", v.gender.as_str(), v.slug),
            variant_label: format!("{} / {}", v.color, v.size),
            image_url: v.image_url.clone(),
            quantity: line.quantity,
            unit_price: filters::price(v.unit_price, cart.currency),
            line_total: filters::price(line.line_total, cart.currency),
            stock_note: line
                .exceeds_stock
                .then(|| format!("Only {} in stock", v.stock.max(0))),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    pub discount: Option<String>,
    pub shipping: String,
    pub total: String,
    pub coupon_code: Option<String>,
    pub coupon_error: Option<String>,
    pub free_shipping_note: Option<String>,
    pub has_shortage: bool,
    pub max_quantity: u32,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &PricedCart) -> Self {
        let totals = &cart.totals;
        let price = |amount| filters::price(amount, cart.currency);
        Self {
            lines: cart.lines.iter().map(|l| CartLineView::new(l, cart)).collect(),
            item_count: totals.item_count,
            subtotal: price(totals.subtotal),
            discount: (!totals.discount.is_zero()).then(|| price(totals.discount)),
            shipping: if totals.shipping.is_zero() {
                "Free".to_string()
            } else {
                price(totals.shipping)
            },
            total: price(totals.total),
            coupon_code: cart.coupon_code.clone(),
            coupon_error: totals.coupon_error.as_ref().map(ToString::to_string),
            free_shipping_note: cart
                .free_shipping_remaining
                .map(|remaining| format!("Spend {} more for free shipping", price(remaining))),
            has_shortage: cart.first_shortage().is_some(),
            max_quantity: MAX_LINE_QUANTITY,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Load, price and (if lines were dropped) re-save the session cart.
///
/// # Errors
///
/// Returns an error if the catalog or settings cannot be read.
pub async fn load_priced(state: &AppState, session: &Session) -> Result<PricedCart> {
    let mut cart = SessionCart::load(session).await;
    let before = cart.lines.len();
    let coupon_code = cart::coupon_code(session).await;
    let settings = state.settings().await?;

    let priced = cart::price(state.pool(), &mut cart, coupon_code.as_deref(), &settings).await?;
    if cart.lines.len() != before {
        cart.save(session).await?;
    }
    Ok(priced)
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
}

/// Cart items and summary fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub variant_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub variant_id: i32,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let priced = load_priced(&state, &session).await?;
    Ok(CartShowTemplate {
        ctx,
        cart: CartView::new(&priced),
    })
}

/// Re-render the cart after a change: the items fragment for HTMX, a
/// redirect otherwise.
async fn cart_changed(state: &AppState, session: &Session, headers: &HeaderMap) -> Result<Response> {
    if !is_htmx(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }
    let priced = load_priced(state, session).await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::new(&priced),
        },
    )
        .into_response())
}

/// Add item to cart.
///
/// HTMX requests get the new count badge and a `cart-updated` trigger.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let variant_id = VariantId::new(form.variant_id);
    let variant = ProductRepository::new(state.pool())
        .cart_variants(&[variant_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("This product is no longer available".to_string()))?;

    if variant.stock <= 0 {
        return Err(AppError::OutOfStock(format!(
            "{} ({} / {}) is sold out",
            variant.product_name, variant.color, variant.size
        )));
    }

    let mut cart = SessionCart::load(&session).await;
    cart.add(variant_id, form.quantity.unwrap_or(1));
    cart.save(&session).await?;
    tracing::info!(variant_id = %variant_id, count = cart.item_count(), "added to cart");

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response());
    }

    flash::push(
        &session,
        Flash::info(format!("{} added to your cart", variant.product_name)),
    )
    .await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Update cart item quantity. Zero removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = SessionCart::load(&session).await;
    cart.set_quantity(VariantId::new(form.variant_id), form.quantity);
    cart.save(&session).await?;
    cart_changed(&state, &session, &headers).await
}

/// Remove item from cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = SessionCart::load(&session).await;
    cart.remove(VariantId::new(form.variant_id));
    cart.save(&session).await?;
    cart_changed(&state, &session, &headers).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: SessionCart::load(&session).await.item_count(),
    }
}

/// Apply a coupon code.
///
/// Unknown codes are rejected here; a known code is stored even if it does
/// not currently apply, and the cart explains why.
#[instrument(skip(state, session, headers, form))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let code = normalize_coupon_code(&form.code);
    if code.is_empty() {
        flash::push(&session, Flash::error("Enter a coupon code")).await?;
        return cart_changed(&state, &session, &headers).await;
    }

    let exists = solera_db::CouponRepository::new(state.pool())
        .get_by_code(&code)
        .await?
        .is_some();

    if exists {
        cart::set_coupon_code(&session, &code).await?;
        tracing::info!(code = %code, "coupon applied");
    } else {
        flash::push(&session, Flash::error(format!("Coupon {code} was not found"))).await?;
    }
    cart_changed(&state, &session, &headers).await
}

/// Remove the applied coupon.
#[instrument(skip(state, session, headers))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    cart::clear_coupon_code(&session).await?;
    cart_changed(&state, &session, &headers).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use solera_core::{Gender, ProductId};
    use solera_db::models::{CartVariant, StoreSettings};

    fn variant(id: i32, price: i64, stock: i32) -> CartVariant {
        CartVariant {
            variant_id: VariantId::new(id),
            product_id: ProductId::new(1),
            gender: Gender::Men,
            slug: "assos".to_string(),
            product_name: "Assos".to_string(),
            sku: format!("ASS-{id}"),
            size: "42".to_string(),
            color: "Kahve".to_string(),
            unit_price: Decimal::new(price, 0),
            stock,
            image_url: None,
        }
    }

    #[test]
    fn test_cart_view_formats_totals() {
        let mut session_cart = SessionCart::default();
        session_cart.add(VariantId::new(1), 2);
        let priced = cart::assemble(
            &session_cart,
            &[variant(1, 900, 5)],
            None,
            &StoreSettings::default(),
            Utc::now(),
        );
        let view = CartView::new(&priced);

        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, "₺1800.00");
        assert_eq!(view.shipping, "Free");
        assert_eq!(view.total, "₺1800.00");
        assert!(view.discount.is_none());
        assert_eq!(view.lines[0].url, "/shop/men/assos");
        assert_eq!(view.lines[0].variant_label, "Kahve / 42");
    }

    #[test]
    fn test_cart_view_flags_shortage_and_unknown_coupon() {
        let mut session_cart = SessionCart::default();
        session_cart.add(VariantId::new(1), 3);
        let priced = cart::assemble(
            &session_cart,
            &[variant(1, 400, 1)],
            Some(("YOK", None)),
            &StoreSettings::default(),
            Utc::now(),
        );
        let view = CartView::new(&priced);

        assert!(view.has_shortage);
        assert_eq!(view.lines[0].stock_note.as_deref(), Some("Only 1 in stock"));
        assert_eq!(view.coupon_code.as_deref(), Some("YOK"));
        assert_eq!(view.coupon_error.as_deref(), Some("coupon not found"));
        assert!(view.free_shipping_note.is_some());
    }
}
