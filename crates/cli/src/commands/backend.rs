//! REST backend checks.

use std::time::Duration;

use yakimoto_storefront::backend::{BackendClient, BackendError};
use yakimoto_storefront::config::BackendConfig;

/// Errors while reaching the backend.
#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("Missing environment variable: BACKEND_API_URL")]
    MissingUrl,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Check that the backend answers and summarize its catalog.
///
/// # Errors
///
/// Returns an error if `BACKEND_API_URL` is unset or the backend fails.
pub async fn ping() -> Result<(), PingError> {
    dotenvy::dotenv().ok();
    let api_url = std::env::var("BACKEND_API_URL").map_err(|_| PingError::MissingUrl)?;

    let client = BackendClient::new(&BackendConfig {
        api_url: api_url.trim_end_matches('/').to_string(),
        timeout: Duration::from_secs(10),
        cache_ttl: Duration::from_secs(1),
    })?;

    client.health().await?;
    tracing::info!(url = %client.base_url(), "Backend is up");

    let products = client.products().await?;
    let categories = client.categories().await?;
    let in_stock = products
        .iter()
        .filter(|p| p.stock_status().is_available())
        .count();
    tracing::info!(
        products = products.len(),
        in_stock,
        categories = categories.len(),
        "Catalog reachable"
    );
    Ok(())
}
