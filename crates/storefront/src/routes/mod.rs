//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (categories, featured hero)
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database + backend)
//!
//! # Catalog
//! GET  /products                  - Product listing
//! GET  /products/{id}             - Product detail
//! GET  /category/{name}           - Products in a category
//!
//! # Cart (rate limited)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add a product in a size
//! POST /cart/update               - Set a line's quantity
//! POST /cart/remove               - Remove a line
//! GET  /cart/count                - Cart count badge (fragment)
//!
//! # Checkout (rate limited)
//! GET  /checkout                  - Checkout form
//! POST /checkout                  - Place a Swish/Bankgiro order
//! POST /checkout/payment-intent   - Create a Stripe payment intent (JSON)
//! POST /checkout/confirm          - Record a card order (JSON)
//! GET  /checkout/complete         - Order confirmation
//!
//! # SEO
//! GET  /sitemap.xml
//! GET  /robots.txt
//! ```

pub mod cart;
pub mod category;
pub mod checkout;
pub mod home;
pub mod products;
pub mod sitemap;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{cart_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .layer(cart_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(mutations)
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    let submissions = Router::new()
        .route("/", post(checkout::submit))
        .route("/payment-intent", post(checkout::payment_intent))
        .route("/confirm", post(checkout::confirm))
        .layer(checkout_rate_limiter());

    Router::new()
        .route("/", get(checkout::show))
        .route("/complete", get(checkout::complete))
        .merge(submissions)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .route("/category/{name}", get(category::show))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/sitemap.xml", get(sitemap::sitemap))
        .route("/robots.txt", get(sitemap::robots))
}
