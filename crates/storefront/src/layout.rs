//! Data shared by every page rendered inside `base.html`.

use tower_sessions::Session;

use crate::analytics::{self, AnalyticsEvent};
use crate::config::AnalyticsConfig;
use crate::flash::{self, Flash};
use crate::models::load_cart;
use crate::seo::PageMeta;
use crate::state::AppState;

/// Page chrome: head metadata, header badge, toasts, and analytics payloads.
#[derive(Debug, Clone)]
pub struct Layout {
    pub shop_name: String,
    pub meta: PageMeta,
    pub nonce: String,
    pub analytics: AnalyticsConfig,
    pub cart_count: u32,
    pub flashes: Vec<Flash>,
    /// Queued GA events as escaped JSON, `[]` when none
    pub events_json: String,
    /// Escaped JSON-LD block, if the page has structured data
    pub structured_data: Option<String>,
}

impl Layout {
    /// Collect the layout for a page, consuming queued flashes and events.
    ///
    /// `events` are raised by the page itself and rendered after the queued
    /// ones.
    pub async fn build(
        state: &AppState,
        session: &Session,
        nonce: String,
        meta: PageMeta,
        events: Vec<AnalyticsEvent>,
    ) -> Self {
        let cart_count = match load_cart(session).await {
            Ok(cart) => cart.item_count(),
            Err(e) => {
                tracing::warn!("Failed to load cart for header: {e}");
                0
            }
        };

        let mut queued = analytics::take_queued(session).await;
        queued.extend(events);

        Self {
            shop_name: state.config().shop.name.clone(),
            meta,
            nonce,
            analytics: state.config().analytics.clone(),
            cart_count,
            flashes: flash::take(session).await,
            events_json: analytics::events_json(&queued),
            structured_data: None,
        }
    }

    #[must_use]
    pub fn with_structured_data(mut self, json_ld: String) -> Self {
        self.structured_data = Some(json_ld);
        self
    }
}
