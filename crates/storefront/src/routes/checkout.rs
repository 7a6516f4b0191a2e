//! Checkout route handlers.
//!
//! Swish and Bankgiro orders are plain form posts placed directly with the
//! backend. Card payments go through Stripe Elements in `static/js/checkout.js`,
//! which calls the two JSON endpoints here: one to create the payment intent
//! and one to confirm the order once Stripe reports success. In every case the
//! order is built from the session cart, never from totals sent by the browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;
use yakimoto_core::cart::Cart;
use yakimoto_core::checkout::{
    Customer, CustomerForm, DeliveryMethod, FieldErrors, OrderRequest, OrderTotals,
    PaymentConfirmation, PaymentMethod,
};

use super::cart::CartView;
use crate::analytics::{AnalyticsEvent, AnalyticsItem};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::flash::{self, Flash};
use crate::layout::Layout;
use crate::middleware::CspNonce;
use crate::models::{LastOrder, load_cart, save_cart, session_keys};
use crate::seo::PageMeta;
use crate::state::AppState;

const EMPTY_CART: &str = "Din kundvagn är tom.";
const ORDER_FAILED: &str = "Något gick fel. Försök igen.";
const USE_CARD_FORM: &str = "För kortbetalning, använd kortformuläret nedan.";

// =============================================================================
// View Types
// =============================================================================

/// Order summary figures.
#[derive(Clone)]
pub struct TotalsView {
    pub items_total: String,
    pub delivery_cost: String,
    pub total: String,
}

impl From<OrderTotals> for TotalsView {
    fn from(totals: OrderTotals) -> Self {
        Self {
            items_total: totals.items_total.display(),
            delivery_cost: if totals.delivery_cost.is_positive() {
                totals.delivery_cost.display()
            } else {
                "Gratis".to_string()
            },
            total: totals.total.display(),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub form: CustomerForm,
    pub errors: FieldErrors,
    pub totals: TotalsView,
    /// Postnord fee as shown next to the delivery option
    pub postnord_cost: String,
    /// Plain numbers for live totals in the browser
    pub items_total_plain: String,
    pub postnord_cost_plain: String,
    pub pickup_location: String,
    pub stripe_key: Option<String>,
    pub payment_error: Option<String>,
}

impl CheckoutShowTemplate {
    fn is_postnord(&self) -> bool {
        self.form.delivery_method == DeliveryMethod::Postnord
    }

    fn is_payment(&self, method: &str) -> bool {
        self.form.payment.as_str() == method
    }

    fn field_class(&self, field: &str) -> &'static str {
        if self.errors.has(field) {
            "input input-error"
        } else {
            "input"
        }
    }
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CheckoutCompleteTemplate {
    pub layout: Layout,
    pub order: LastOrder,
    pub pickup_location: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// What the customer entered, plus anything to point out about it.
struct FormInput {
    form: CustomerForm,
    errors: FieldErrors,
    payment_error: Option<String>,
}

impl FormInput {
    fn new(form: CustomerForm) -> Self {
        Self {
            form,
            errors: FieldErrors::default(),
            payment_error: None,
        }
    }

    fn with_errors(form: CustomerForm, errors: FieldErrors) -> Self {
        Self {
            errors,
            ..Self::new(form)
        }
    }

    fn with_payment_error(form: CustomerForm, message: &str) -> Self {
        Self {
            payment_error: Some(message.to_string()),
            ..Self::new(form)
        }
    }
}

async fn render_form(
    state: &AppState,
    session: &Session,
    nonce: String,
    cart: &Cart,
    input: FormInput,
    events: Vec<AnalyticsEvent>,
) -> CheckoutShowTemplate {
    let config = state.config();
    let shop = &config.shop;
    let stripe_key = state
        .backend()
        .stripe_publishable_key()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Card payments unavailable: {e}");
            None
        });
    let totals = OrderTotals::compute(cart, input.form.delivery_method, shop.postnord_cost);
    let meta = PageMeta::checkout(&config.base_url, &shop.name, &shop.pickup_location);

    CheckoutShowTemplate {
        layout: Layout::build(state, session, nonce, meta, events).await,
        cart: CartView::new(cart, state.images()),
        form: input.form,
        errors: input.errors,
        totals: totals.into(),
        postnord_cost: shop.postnord_cost.display(),
        items_total_plain: totals.items_total.to_plain_string(),
        postnord_cost_plain: shop.postnord_cost.to_plain_string(),
        pickup_location: shop.pickup_location.clone(),
        stripe_key,
        payment_error: input.payment_error,
    }
}

fn build_order(
    state: &AppState,
    customer: &Customer,
    form: &CustomerForm,
    payment: PaymentMethod,
    cart: &Cart,
) -> OrderRequest {
    OrderRequest::new(
        customer,
        form.delivery_method,
        payment,
        cart,
        state.config().shop.postnord_cost,
        chrono::Utc::now(),
    )
}

/// Empty the cart and remember the order for the confirmation page.
async fn finish_order(
    session: &Session,
    transaction_id: String,
    customer: &Customer,
    order: &OrderRequest,
    cart: &Cart,
) -> Result<()> {
    let last_order = LastOrder {
        transaction_id,
        customer_name: customer.full_name(),
        email: customer.email.to_string(),
        delivery: order.delivery_method,
        payment: order.payment,
        total: order.total,
        items: cart.items().iter().map(AnalyticsItem::from).collect(),
    };
    save_cart(session, &Cart::new()).await?;
    session.insert(session_keys::LAST_ORDER, last_order).await?;
    Ok(())
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn validation_error(errors: &FieldErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "errors": errors })),
    )
        .into_response()
}

// =============================================================================
// Page Handlers
// =============================================================================

/// Display the checkout form.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        flash::push(&session, Flash::info(EMPTY_CART)).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    let begin = AnalyticsEvent::begin_checkout(&cart);
    let input = FormInput::new(CustomerForm::default());
    Ok(render_form(&state, &session, nonce, &cart, input, vec![begin])
        .await
        .into_response())
}

/// Place a Swish or Bankgiro order.
#[instrument(skip(state, session, nonce, form), fields(payment = form.payment.as_str()))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<CustomerForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        flash::push(&session, Flash::error(EMPTY_CART)).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    let customer = match form.validate() {
        Ok(customer) => customer,
        Err(errors) => {
            let input = FormInput::with_errors(form, errors);
            let page = render_form(&state, &session, nonce, &cart, input, Vec::new()).await;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    if !form.payment.is_manual() {
        let input = FormInput::with_payment_error(form, USE_CARD_FORM);
        let page = render_form(&state, &session, nonce, &cart, input, Vec::new()).await;
        return Ok(page.into_response());
    }

    let order = build_order(&state, &customer, &form, form.payment, &cart);
    if let Err(e) = state.backend().place_order(&order).await {
        tracing::error!(error = %e, "Order submission failed");
        let input = FormInput::with_payment_error(form, ORDER_FAILED);
        let page = render_form(&state, &session, nonce, &cart, input, Vec::new()).await;
        return Ok((AppError::from(e).status(), page).into_response());
    }

    add_breadcrumb("checkout", "Order placed", Some(&[("payment", form.payment.as_str())]));
    finish_order(&session, Uuid::new_v4().to_string(), &customer, &order, &cart).await?;
    Ok(Redirect::to("/checkout/complete").into_response())
}

/// Show the confirmation for the order just placed.
///
/// The order is taken out of the session so a reload does not report the
/// purchase twice.
#[instrument(skip(state, session, nonce))]
pub async fn complete(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    let Some(order) = session.remove::<LastOrder>(session_keys::LAST_ORDER).await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let config = state.config();
    let meta = PageMeta::new(
        &config.base_url,
        "/checkout/complete",
        format!("Tack för din beställning! - {}", config.shop.name),
        "Tack för din beställning!".to_string(),
    )
    .noindex();
    let purchase = AnalyticsEvent::purchase(&order.transaction_id, order.total, order.items.clone());

    Ok(CheckoutCompleteTemplate {
        layout: Layout::build(&state, &session, nonce, meta, vec![purchase]).await,
        order,
        pickup_location: config.shop.pickup_location.clone(),
    }
    .into_response())
}

// =============================================================================
// Card Payment (JSON) Handlers
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Create a Stripe payment intent for the session cart.
///
/// Responds `422 {errors}` on invalid customer details and `400 {error}` for
/// an empty cart.
#[instrument(skip(state, session, form))]
pub async fn payment_intent(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CustomerForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(json_error(StatusCode::BAD_REQUEST, EMPTY_CART));
    }
    let customer = match form.validate() {
        Ok(customer) => customer,
        Err(errors) => return Ok(validation_error(&errors)),
    };

    let order = build_order(&state, &customer, &form, PaymentMethod::Stripe, &cart);
    match state.backend().create_payment_intent(&order).await {
        Ok(intent) => Ok(Json(PaymentIntentResponse {
            client_secret: intent.client_secret,
        })
        .into_response()),
        Err(e) => {
            let status = AppError::from(e).status();
            Ok(json_error(status, "Något gick fel vid betalning. Försök igen."))
        }
    }
}

/// Body of the card confirmation call: the Stripe intent plus the same
/// customer fields as the form.
#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
    #[serde(flatten)]
    pub customer: CustomerForm,
}

/// Record a card order after Stripe reported the payment as succeeded.
#[instrument(skip(state, session, body), fields(payment_intent_id = %body.payment_intent_id))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ConfirmPaymentRequest>,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(json_error(StatusCode::BAD_REQUEST, EMPTY_CART));
    }
    if body.payment_intent_id.trim().is_empty() {
        return Ok(json_error(StatusCode::BAD_REQUEST, "Betalning saknas."));
    }
    let form = body.customer;
    let customer = match form.validate() {
        Ok(customer) => customer,
        Err(errors) => return Ok(validation_error(&errors)),
    };

    let order = build_order(&state, &customer, &form, PaymentMethod::Stripe, &cart);
    let confirmation = PaymentConfirmation {
        payment_intent_id: &body.payment_intent_id,
        order: &order,
    };
    if let Err(e) = state.backend().confirm_payment(&confirmation).await {
        tracing::error!(error = %e, "Payment confirmation failed");
        let status = AppError::from(e).status();
        return Ok(json_error(status, ORDER_FAILED));
    }

    add_breadcrumb("checkout", "Card payment confirmed", None);
    finish_order(&session, body.payment_intent_id, &customer, &order, &cart).await?;
    Ok(Json(json!({ "redirect": "/checkout/complete" })).into_response())
}
