//! Checkout wizard route handlers.
//!
//! Contact, shipping and payment each post into a [`CheckoutDraft`] kept in
//! the session. A step whose predecessors are incomplete redirects to the
//! first step that still needs input.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use solera_core::PaymentMethod;
use solera_core::checkout::{
    CheckoutDraft, CheckoutStep, ContactDetails, FieldError, ShippingAddress, normalize_phone,
};
use solera_db::OrderRepository;
use solera_db::models::NewOrder;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::Flash;
use crate::page::PageContext;
use crate::routes::cart::{CartView, load_priced};
use crate::services::cart::{self, SessionCart};
use crate::services::{checkout, flash};
use crate::state::AppState;

/// Longest order note accepted.
const MAX_NOTE_LENGTH: usize = 500;

// =============================================================================
// Views
// =============================================================================

/// Progress indicator entry.
#[derive(Debug, Clone)]
pub struct StepView {
    pub label: &'static str,
    pub url: &'static str,
    pub state: &'static str,
}

fn steps(draft: &CheckoutDraft, current: CheckoutStep) -> Vec<StepView> {
    CheckoutStep::ALL
        .into_iter()
        .map(|step| StepView {
            label: step.label(),
            url: step.path(),
            state: if step == current {
                "current"
            } else if step < current || draft.can_enter(step) {
                "done"
            } else {
                "upcoming"
            },
        })
        .collect()
}

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Select option.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// City select option; the id drives the district lookup.
#[derive(Debug, Clone)]
pub struct CityOption {
    pub id: u16,
    pub name: String,
    pub selected: bool,
}

/// Contact step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/contact.html")]
pub struct ContactTemplate {
    pub ctx: PageContext,
    pub steps: Vec<StepView>,
    pub form: ContactDetails,
    pub errors: FormErrors,
}

/// Shipping step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub ctx: PageContext,
    pub steps: Vec<StepView>,
    pub form: ShippingAddress,
    pub cities: Vec<CityOption>,
    pub districts: Vec<ChoiceView>,
    pub errors: FormErrors,
}

/// Payment step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub ctx: PageContext,
    pub steps: Vec<StepView>,
    pub methods: Vec<ChoiceView>,
    pub note: String,
    pub errors: FormErrors,
}

/// Review step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewTemplate {
    pub ctx: PageContext,
    pub steps: Vec<StepView>,
    pub cart: CartView,
    pub contact: ContactDetails,
    pub shipping: ShippingAddress,
    pub payment_label: &'static str,
    pub note: Option<String>,
}

// =============================================================================
// Guards
// =============================================================================

/// Where to send a customer who may not be on `step`, if anywhere.
fn guard(cart: &SessionCart, draft: &CheckoutDraft, step: CheckoutStep) -> Option<&'static str> {
    if cart.is_empty() {
        return Some("/cart");
    }
    if !draft.can_enter(step) {
        return Some(draft.next_step().path());
    }
    None
}

/// Redirect to the first step that still needs input.
#[instrument(skip(session))]
pub async fn start(session: Session) -> Redirect {
    if SessionCart::load(&session).await.is_empty() {
        return Redirect::to("/cart");
    }
    let draft = checkout::load_draft(&session).await;
    Redirect::to(draft.next_step().path())
}

// =============================================================================
// Contact
// =============================================================================

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub email: String,
    pub full_name: String,
    pub phone: String,
}

/// Display the contact step, prefilled from the draft or the account.
#[instrument(skip(session, ctx))]
pub async fn contact_page(session: Session, ctx: PageContext) -> Response {
    let cart = SessionCart::load(&session).await;
    let draft = checkout::load_draft(&session).await;
    if let Some(to) = guard(&cart, &draft, CheckoutStep::Contact) {
        return Redirect::to(to).into_response();
    }

    let form = draft.contact.clone().unwrap_or_else(|| {
        ctx.user
            .as_ref()
            .map(|u| ContactDetails {
                email: u.email.as_str().to_string(),
                full_name: u.full_name.clone(),
                phone: String::new(),
            })
            .unwrap_or_default()
    });

    ContactTemplate {
        steps: steps(&draft, CheckoutStep::Contact),
        form,
        errors: FormErrors::default(),
        ctx,
    }
    .into_response()
}

/// Save the contact step.
#[instrument(skip(session, ctx, form))]
pub async fn contact(
    session: Session,
    ctx: PageContext,
    Form(form): Form<ContactForm>,
) -> Result<Response> {
    let mut details = ContactDetails {
        email: form.email.trim().to_lowercase(),
        full_name: form.full_name.trim().to_string(),
        phone: form.phone.trim().to_string(),
    };

    let mut draft = checkout::load_draft(&session).await;
    if let Err(errors) = details.validate() {
        return Ok(ContactTemplate {
            steps: steps(&draft, CheckoutStep::Contact),
            form: details,
            errors: FormErrors(errors),
            ctx,
        }
        .into_response());
    }

    if let Some(phone) = normalize_phone(&details.phone) {
        details.phone = phone;
    }
    draft.contact = Some(details);
    checkout::save_draft(&session, &draft).await?;
    Ok(Redirect::to(draft.next_step().path()).into_response())
}

// =============================================================================
// Shipping
// =============================================================================

fn shipping_template(
    state: &AppState,
    ctx: PageContext,
    draft: &CheckoutDraft,
    form: ShippingAddress,
    errors: FormErrors,
) -> ShippingTemplate {
    let locations = state.locations();
    let cities = locations
        .cities()
        .into_iter()
        .map(|c| CityOption {
            id: c.id,
            name: c.name.to_string(),
            selected: c.name == form.city,
        })
        .collect();
    let districts = locations
        .districts_of(&form.city)
        .iter()
        .map(|d| ChoiceView {
            value: d.clone(),
            label: d.clone(),
            selected: *d == form.district,
        })
        .collect();

    ShippingTemplate {
        steps: steps(draft, CheckoutStep::Shipping),
        form,
        cities,
        districts,
        errors,
        ctx,
    }
}

/// Display the shipping step.
#[instrument(skip(state, session, ctx))]
pub async fn shipping_page(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Response {
    let cart = SessionCart::load(&session).await;
    let draft = checkout::load_draft(&session).await;
    if let Some(to) = guard(&cart, &draft, CheckoutStep::Shipping) {
        return Redirect::to(to).into_response();
    }
    let form = draft.shipping.clone().unwrap_or_default();
    shipping_template(&state, ctx, &draft, form, FormErrors::default()).into_response()
}

/// Save the shipping step.
#[instrument(skip(state, session, ctx, form))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<ShippingAddress>,
) -> Result<Response> {
    let mut draft = checkout::load_draft(&session).await;
    if !draft.can_enter(CheckoutStep::Shipping) {
        return Ok(Redirect::to(draft.next_step().path()).into_response());
    }

    let address = ShippingAddress {
        city: form.city.trim().to_string(),
        district: form.district.trim().to_string(),
        address_line: form.address_line.trim().to_string(),
        postal_code: form.postal_code.trim().to_string(),
    };
    if let Err(errors) = checkout::validate_address(&address, state.locations()) {
        return Ok(
            shipping_template(&state, ctx, &draft, address, FormErrors(errors)).into_response(),
        );
    }

    draft.shipping = Some(address);
    checkout::save_draft(&session, &draft).await?;
    Ok(Redirect::to(draft.next_step().path()).into_response())
}

// =============================================================================
// Payment
// =============================================================================

/// Payment form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment_method: String,
    #[serde(default)]
    pub note: String,
}

fn method_choices(selected: Option<PaymentMethod>) -> Vec<ChoiceView> {
    PaymentMethod::ALL
        .into_iter()
        .map(|m| ChoiceView {
            value: m.as_str().to_string(),
            label: m.label().to_string(),
            selected: selected == Some(m),
        })
        .collect()
}

/// Display the payment step.
#[instrument(skip(session, ctx))]
pub async fn payment_page(session: Session, ctx: PageContext) -> Response {
    let cart = SessionCart::load(&session).await;
    let draft = checkout::load_draft(&session).await;
    if let Some(to) = guard(&cart, &draft, CheckoutStep::Payment) {
        return Redirect::to(to).into_response();
    }

    PaymentTemplate {
        steps: steps(&draft, CheckoutStep::Payment),
        methods: method_choices(draft.payment_method),
        note: draft.note.clone().unwrap_or_default(),
        errors: FormErrors::default(),
        ctx,
    }
    .into_response()
}

/// Save the payment step.
#[instrument(skip(session, ctx, form))]
pub async fn payment(
    session: Session,
    ctx: PageContext,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let mut draft = checkout::load_draft(&session).await;
    if !draft.can_enter(CheckoutStep::Payment) {
        return Ok(Redirect::to(draft.next_step().path()).into_response());
    }

    let note = form.note.trim().to_string();
    let method = form.payment_method.parse::<PaymentMethod>().ok();

    let mut errors = Vec::new();
    if method.is_none() {
        errors.push(FieldError {
            field: "payment_method",
            message: "choose a payment method".to_string(),
        });
    }
    if note.chars().count() > MAX_NOTE_LENGTH {
        errors.push(FieldError {
            field: "note",
            message: format!("note must be at most {MAX_NOTE_LENGTH} characters"),
        });
    }
    if !errors.is_empty() {
        return Ok(PaymentTemplate {
            steps: steps(&draft, CheckoutStep::Payment),
            methods: method_choices(method),
            note,
            errors: FormErrors(errors),
            ctx,
        }
        .into_response());
    }

    draft.payment_method = method;
    draft.note = (!note.is_empty()).then_some(note);
    checkout::save_draft(&session, &draft).await?;
    Ok(Redirect::to(CheckoutStep::Review.path()).into_response())
}

// =============================================================================
// Review and place
// =============================================================================

/// Display the order summary before placing it.
#[instrument(skip(state, session, ctx))]
pub async fn review(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Result<Response> {
    let draft = checkout::load_draft(&session).await;
    let priced = load_priced(&state, &session).await?;
    if priced.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }
    let (Some(contact), Some(shipping), Some(method)) = (
        draft.contact.clone(),
        draft.shipping.clone(),
        draft.payment_method,
    ) else {
        return Ok(Redirect::to(draft.next_step().path()).into_response());
    };
    if !draft.is_complete() {
        return Ok(Redirect::to(draft.next_step().path()).into_response());
    }

    Ok(ReviewTemplate {
        steps: steps(&draft, CheckoutStep::Review),
        cart: CartView::new(&priced),
        contact,
        shipping,
        payment_label: method.label(),
        note: draft.note.clone(),
        ctx,
    }
    .into_response())
}

/// Place the order.
///
/// On success the cart, coupon and draft are cleared and the customer lands
/// on the order page. Stock and coupon problems send them back to the cart.
#[instrument(skip(state, session, user))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    let draft = checkout::load_draft(&session).await;
    let cart = SessionCart::load(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }
    let (Some(contact), Some(address), Some(payment_method)) = (
        draft.contact.clone(),
        draft.shipping.clone(),
        draft.payment_method,
    ) else {
        return Ok(Redirect::to(draft.next_step().path()).into_response());
    };
    if !draft.is_complete() {
        return Ok(Redirect::to(draft.next_step().path()).into_response());
    }

    let settings = state.settings().await?;
    let order = NewOrder {
        user_id: user.map(|u| u.id),
        contact,
        address,
        payment_method,
        note: draft.note.clone(),
        lines: cart.order_lines(),
        coupon_code: cart::coupon_code(&session).await,
        shipping: settings.shipping_policy(),
        currency: settings.currency,
    };

    let placed = match OrderRepository::new(state.pool()).place(&order).await {
        Ok(placed) => placed,
        Err(e) => {
            let err = AppError::from(e);
            if err.status().is_server_error() {
                return Err(err);
            }
            tracing::info!(reason = %err, "order rejected");
            flash::push(&session, Flash::error(err.public_message())).await?;
            return Ok(Redirect::to("/cart").into_response());
        }
    };

    SessionCart::clear(&session).await?;
    cart::clear_coupon_code(&session).await?;
    checkout::clear_draft(&session).await?;
    add_breadcrumb(
        "checkout",
        "order placed",
        Some(&[("order_number", placed.order_number.as_str())]),
    );

    flash::push(
        &session,
        Flash::info(format!(
            "Thank you! Your order {} has been received.",
            placed.order_number
        )),
    )
    .await?;
    Ok(Redirect::to(&format!("/orders/{}", placed.tracking_token.as_str())).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use solera_core::VariantId;

    fn complete_draft() -> CheckoutDraft {
        CheckoutDraft {
            contact: Some(ContactDetails {
                email: "ayse@example.com".to_string(),
                full_name: "Ayşe Yılmaz".to_string(),
                phone: "05321234567".to_string(),
            }),
            shipping: Some(ShippingAddress {
                city: "İzmir".to_string(),
                district: "Karşıyaka".to_string(),
                address_line: "Cemal Gürsel Cd. 12".to_string(),
                postal_code: "35600".to_string(),
            }),
            payment_method: Some(PaymentMethod::Card),
            note: None,
        }
    }

    fn cart_with_item() -> SessionCart {
        let mut cart = SessionCart::default();
        cart.add(VariantId::new(7), 1);
        cart
    }

    #[test]
    fn test_guard_sends_empty_cart_back() {
        let draft = complete_draft();
        assert_eq!(
            guard(&SessionCart::default(), &draft, CheckoutStep::Review),
            Some("/cart")
        );
    }

    #[test]
    fn test_guard_redirects_to_first_missing_step() {
        let draft = CheckoutDraft::default();
        assert_eq!(
            guard(&cart_with_item(), &draft, CheckoutStep::Payment),
            Some("/checkout/contact")
        );
        assert_eq!(guard(&cart_with_item(), &draft, CheckoutStep::Contact), None);
    }

    #[test]
    fn test_guard_allows_complete_draft_anywhere() {
        let draft = complete_draft();
        for step in CheckoutStep::ALL {
            assert_eq!(guard(&cart_with_item(), &draft, step), None);
        }
    }

    #[test]
    fn test_step_states() {
        let mut draft = complete_draft();
        draft.payment_method = None;
        let states: Vec<&str> = steps(&draft, CheckoutStep::Payment)
            .iter()
            .map(|s| s.state)
            .collect();
        assert_eq!(states, vec!["done", "done", "current", "upcoming"]);
    }

    #[test]
    fn test_form_errors_lookup() {
        let errors = FormErrors(vec![FieldError {
            field: "phone",
            message: "bad phone".to_string(),
        }]);
        assert_eq!(errors.get("phone"), Some("bad phone"));
        assert_eq!(errors.get("email"), None);
        assert!(!errors.is_empty());
    }
}
