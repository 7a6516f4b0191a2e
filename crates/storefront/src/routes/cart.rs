//! Cart route handlers.
//!
//! The cart lives in the session. Mutations are plain form posts that
//! redirect back (post/redirect/get) with a flash message; stock is always
//! re-read from the backend before a line is added.

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
use yakimoto_core::ProductId;
use yakimoto_core::cart::{Cart, CartError, CartItem};
use yakimoto_core::images::ImageUrls;

use crate::analytics::{self, AnalyticsEvent};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::flash::{self, Flash};
use crate::layout::Layout;
use crate::middleware::CspNonce;
use crate::models::{load_cart, save_cart};
use crate::seo::PageMeta;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub href: String,
    pub name: String,
    pub size: String,
    pub color: Option<String>,
    pub quantity: u32,
    pub available: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: Option<String>,
}

impl CartLineView {
    #[must_use]
    pub fn new(item: &CartItem, images: &ImageUrls) -> Self {
        Self {
            product_id: item.product_id,
            href: format!("/products/{}", item.product_id),
            name: item.name.clone(),
            size: item.selected_size.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            available: item.available,
            unit_price: item.unit_price.display(),
            line_total: item.line_total().display(),
            image_url: item.image.as_deref().map(|f| images.thumbnail(f)),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, images: &ImageUrls) -> Self {
        Self {
            lines: cart
                .items()
                .iter()
                .map(|item| CartLineView::new(item, images))
                .collect(),
            subtotal: cart.subtotal().display(),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
///
/// `size` and `quantity` arrive as raw strings so a missing size or a blank
/// quantity become messages instead of rejected requests.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    /// Local path to return to, defaults to the product page
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Update cart form data.
///
/// `quantity` is a raw string so a blank or mistyped value becomes a message.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub size: String,
    #[serde(default)]
    pub quantity: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    pub size: String,
}

/// Parse a quantity field: blank or invalid means 1, zero is raised to 1.
fn parse_quantity(raw: Option<&str>) -> u32 {
    raw.and_then(|q| q.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

/// Parse an updated quantity; zero is kept since it removes the line.
fn parse_new_quantity(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|q| q.trim().parse::<u32>().ok())
}

/// Only same-site absolute paths are followed after a cart action.
fn safe_return_path(path: Option<&str>) -> Option<&str> {
    path.filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    let config = state.config();
    let meta = PageMeta::new(
        &config.base_url,
        "/cart",
        format!("Kundvagn - {}", config.shop.name),
        format!("Din kundvagn hos {}.", config.shop.name),
    )
    .noindex();

    Ok(CartShowTemplate {
        layout: Layout::build(&state, &session, nonce, meta, Vec::new()).await,
        cart: CartView::new(&cart, state.images()),
    })
}

/// Add a product in a size to the cart.
///
/// The product is re-fetched so the price snapshot and the stock ceiling are
/// current. Redirects back with a flash message either way.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_page = format!("/products/{}", form.product_id);
    let back = safe_return_path(form.return_to.as_deref())
        .unwrap_or(&product_page)
        .to_string();

    let Some(size) = form
        .size
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        flash::push(&session, Flash::error("Välj en storlek först!")).await?;
        return Ok(Redirect::to(&back).into_response());
    };

    let product = state.backend().fresh_product(form.product_id).await?;
    let requested = parse_quantity(form.quantity.as_deref());
    let item = CartItem::from_product(&product, size, requested);

    let mut cart = load_cart(&session).await?;
    let before = cart
        .get(product.id, size)
        .map_or(0, |line| line.quantity);

    match cart.add(item.clone()) {
        Ok(after) => {
            let added = after.saturating_sub(before);
            save_cart(&session, &cart).await?;

            if added > 0 {
                analytics::queue(&session, AnalyticsEvent::add_to_cart(&item, added)).await?;
            }
            let message = if added < requested {
                Flash::info(format!(
                    "Endast {} st finns i lager för storlek {size}.",
                    item.available
                ))
            } else {
                Flash::success(format!("{} ({size}) har lagts i kundvagnen.", product.name))
            };
            flash::push(&session, message).await?;

            let product_id = product.id.to_string();
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", product_id.as_str()), ("size", size)]),
            );
        }
        Err(CartError::OutOfStock { size, .. }) => {
            flash::push(&session, Flash::error(format!("Slut i lager för storlek {size}"))).await?;
        }
        Err(e) => return Err(AppError::BadRequest(e.to_string())),
    }

    Ok(Redirect::to(&back).into_response())
}

/// Set the quantity of a line; zero removes it.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let Some(quantity) = parse_new_quantity(form.quantity.as_deref()) else {
        flash::push(&session, Flash::error("Ange antal som ett heltal, 0 eller mer.")).await?;
        return Ok(Redirect::to("/cart"));
    };

    let mut cart = load_cart(&session).await?;
    let removed = if quantity == 0 {
        cart.get(form.product_id, &form.size).cloned()
    } else {
        None
    };

    match cart.update_quantity(form.product_id, &form.size, quantity) {
        Ok(()) => {
            save_cart(&session, &cart).await?;
            if let Some(line) = removed {
                analytics::queue(&session, AnalyticsEvent::remove_from_cart(&line)).await?;
            }
        }
        Err(CartError::NotInCart) => {
            flash::push(&session, Flash::error("Produkten finns inte längre i kundvagnen.")).await?;
        }
        Err(e) => return Err(AppError::BadRequest(e.to_string())),
    }

    Ok(Redirect::to("/cart"))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await?;
    if let Some(line) = cart.remove(form.product_id, &form.size) {
        save_cart(&session, &cart).await?;
        analytics::queue(&session, AnalyticsEvent::remove_from_cart(&line)).await?;
        flash::push(&session, Flash::info(format!("{} togs bort från kundvagnen.", line.name)))
            .await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Cart count badge fragment.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<CartCountTemplate> {
    let cart = load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}
