//! Session-stored shopping state.
//!
//! The cart lives in the server-side session keyed by the visitor's cookie;
//! nothing about the cart is trusted from the browser.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use yakimoto_core::Price;
use yakimoto_core::cart::Cart;
use yakimoto_core::checkout::{DeliveryMethod, PaymentMethod};

use crate::analytics::AnalyticsItem;

/// Session keys for shopping data.
pub mod keys {
    /// Key for the visitor's cart.
    pub const CART: &str = "cart";

    /// Key for queued flash messages.
    pub const FLASH: &str = "flash";

    /// Key for analytics events waiting for the next rendered page.
    pub const ANALYTICS_EVENTS: &str = "analytics_events";

    /// Key for the order just placed, shown on the confirmation page.
    pub const LAST_ORDER: &str = "last_order";
}

/// Summary of a placed order, for the confirmation page and purchase event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastOrder {
    pub transaction_id: String,
    pub customer_name: String,
    pub email: String,
    pub delivery: DeliveryMethod,
    pub payment: PaymentMethod,
    pub total: Price,
    pub items: Vec<AnalyticsItem>,
}

/// Load the cart from the session, empty if none was stored yet.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}
