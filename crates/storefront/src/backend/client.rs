//! REST backend client implementation.
//!
//! Uses `reqwest` for HTTP and caches catalog reads using `moka`.

use std::sync::Arc;

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use yakimoto_core::ProductId;
use yakimoto_core::catalog::{Category, Product};
use yakimoto_core::checkout::{OrderRequest, PaymentConfirmation, PaymentIntent};

use super::BackendError;
use super::cache::{CacheKey, CacheValue};
use crate::config::BackendConfig;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the shop REST backend.
///
/// Products, categories, and the Stripe publishable key are cached for the
/// configured TTL.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

#[derive(Debug, serde::Deserialize)]
struct PublishableKey {
    publishable_key: String,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("yakimoto-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL of the backend, also the origin of uploaded images.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and decode the JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await.map_err(BackendError::from_transport)?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await.map_err(BackendError::from_transport)?;

        if !status.is_success() {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                debug!(status = %status, "Backend returned client error");
            }
            return Err(BackendError::from_response(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        self.send(self.inner.client.get(self.url(path))).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        self.send(self.inner.client.post(self.url(path)).json(body))
            .await
    }

    /// Check that the backend answers on `GET /`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), BackendError> {
        self.get::<serde_json::Value>("/").await.map(|_| ())
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    async fn cached_products(
        &self,
        key: CacheKey,
        path: &str,
    ) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let products: Vec<Product> = self.get(path).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    /// Get every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, BackendError> {
        self.cached_products(CacheKey::Products, "/products").await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, BackendError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get(&format!("/products/{id}")).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Fetch a product bypassing the cache, for stock checks.
    ///
    /// The result is not written back; cached entries keep their own TTL.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fresh_product(&self, id: ProductId) -> Result<Product, BackendError> {
        self.get(&format!("/products/{id}")).await
    }

    /// Get the products linked to a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products_in_category(&self, name: &str) -> Result<Vec<Product>, BackendError> {
        let path = format!("/products/category/{}", urlencoding::encode(name));
        self.cached_products(CacheKey::CategoryProducts(name.to_owned()), &path)
            .await
    }

    /// Get the products used for the grouped hero panels of a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn grouped_products(&self, category: &str) -> Result<Vec<Product>, BackendError> {
        let path = format!("/products/grouped/{}", urlencoding::encode(category));
        self.cached_products(CacheKey::Grouped(category.to_owned()), &path)
            .await
    }

    /// Get every category, in the order the backend returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let categories: Vec<Category> = self.get("/categories").await?;
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;
        Ok(categories)
    }

    /// Drop every cached catalog read.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Checkout Methods
    // =========================================================================

    /// Get the Stripe publishable key, or `None` when card payments are not
    /// configured on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    #[instrument(skip(self))]
    pub async fn stripe_publishable_key(&self) -> Result<Option<String>, BackendError> {
        if let Some(CacheValue::PublishableKey(key)) =
            self.inner.cache.get(&CacheKey::PublishableKey).await
        {
            return Ok(key);
        }

        let key = match self.get::<PublishableKey>("/stripe-publishable-key").await {
            Ok(body) => Some(body.publishable_key).filter(|k| !k.is_empty()),
            Err(BackendError::Api { status, .. }) if status >= 500 => None,
            Err(e) => return Err(e),
        };
        self.inner
            .cache
            .insert(CacheKey::PublishableKey, CacheValue::PublishableKey(key.clone()))
            .await;
        Ok(key)
    }

    /// Submit a Swish or Bankgiro order.
    ///
    /// The backend notifies the shop and reduces stock, so the catalog cache
    /// is dropped on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the order was not accepted.
    #[instrument(skip(self, order), fields(total = %order.total, items = order.items.len()))]
    pub async fn place_order(&self, order: &OrderRequest) -> Result<(), BackendError> {
        self.post::<_, serde_json::Value>("/checkout", order).await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Create a Stripe payment intent for the order total.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not create the intent.
    #[instrument(skip(self, order), fields(total = %order.total))]
    pub async fn create_payment_intent(
        &self,
        order: &OrderRequest,
    ) -> Result<PaymentIntent, BackendError> {
        self.post("/create-payment-intent", order).await
    }

    /// Confirm a succeeded card payment; the backend then records the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment did not succeed or the order failed.
    #[instrument(skip(self, confirmation), fields(payment_intent_id = %confirmation.payment_intent_id))]
    pub async fn confirm_payment(
        &self,
        confirmation: &PaymentConfirmation<'_>,
    ) -> Result<(), BackendError> {
        self.post::<_, serde_json::Value>("/confirm-payment", confirmation)
            .await?;
        self.invalidate_catalog();
        Ok(())
    }
}
