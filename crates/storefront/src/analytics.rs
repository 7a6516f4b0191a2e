//! Google Analytics 4 e-commerce events.
//!
//! Events are rendered into the page as a JSON block under the CSP nonce and
//! forwarded to `gtag` by `static/js/analytics.js`. Events raised by a POST
//! are queued in the session and rendered on the page the redirect lands on.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use yakimoto_core::cart::{Cart, CartItem};
use yakimoto_core::{CURRENCY_CODE, Price};

use crate::models::session_keys;

/// One line of an e-commerce event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsItem {
    pub item_id: String,
    pub item_name: String,
    pub item_category: String,
    pub item_variant: String,
    pub quantity: u32,
    pub price: Price,
}

impl From<&CartItem> for AnalyticsItem {
    fn from(item: &CartItem) -> Self {
        Self {
            item_id: item.product_id.to_string(),
            item_name: item.name.clone(),
            item_category: item
                .category
                .clone()
                .unwrap_or_else(|| "Product".to_string()),
            item_variant: item.selected_size.clone(),
            quantity: item.quantity,
            price: item.unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParams {
    pub currency: String,
    pub value: Price,
    pub items: Vec<AnalyticsItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// A GA4 event: `gtag('event', name, params)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    pub params: EventParams,
}

impl AnalyticsEvent {
    fn new(name: &str, value: Price, items: Vec<AnalyticsItem>) -> Self {
        Self {
            name: name.to_string(),
            params: EventParams {
                currency: CURRENCY_CODE.to_string(),
                value,
                items,
                transaction_id: None,
            },
        }
    }

    /// `quantity` is how many units were actually added.
    #[must_use]
    pub fn add_to_cart(item: &CartItem, quantity: u32) -> Self {
        let item = AnalyticsItem {
            quantity,
            ..AnalyticsItem::from(item)
        };
        Self::new("add_to_cart", item.price.times(quantity), vec![item])
    }

    #[must_use]
    pub fn remove_from_cart(item: &CartItem) -> Self {
        Self::new(
            "remove_from_cart",
            item.line_total(),
            vec![AnalyticsItem::from(item)],
        )
    }

    #[must_use]
    pub fn begin_checkout(cart: &Cart) -> Self {
        Self::new(
            "begin_checkout",
            cart.subtotal(),
            cart.items().iter().map(AnalyticsItem::from).collect(),
        )
    }

    #[must_use]
    pub fn purchase(transaction_id: &str, value: Price, items: Vec<AnalyticsItem>) -> Self {
        let mut event = Self::new("purchase", value, items);
        event.params.transaction_id = Some(transaction_id.to_string());
        event
    }
}

/// Serialize events for an inline `<script type="application/json">` block.
#[must_use]
pub fn events_json(events: &[AnalyticsEvent]) -> String {
    escape_script_json(&serde_json::to_string(events).unwrap_or_else(|_| "[]".to_string()))
}

/// Make JSON safe to embed inside a `<script>` element.
#[must_use]
pub fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Queue an event for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn queue(
    session: &Session,
    event: AnalyticsEvent,
) -> Result<(), tower_sessions::session::Error> {
    let mut queued: Vec<AnalyticsEvent> = session
        .get(session_keys::ANALYTICS_EVENTS)
        .await?
        .unwrap_or_default();
    queued.push(event);
    session.insert(session_keys::ANALYTICS_EVENTS, queued).await
}

/// Remove and return queued events.
pub async fn take_queued(session: &Session) -> Vec<AnalyticsEvent> {
    session
        .remove::<Vec<AnalyticsEvent>>(session_keys::ANALYTICS_EVENTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
