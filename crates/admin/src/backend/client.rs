//! REST backend client implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::multipart::Form;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use yakimoto_core::catalog::{Category, Product};
use yakimoto_core::{CategoryId, ProductId};

use super::BackendError;
use super::forms::{CategorySubmission, InventoryMove, ProductSubmission};
use crate::config::AdminConfig;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Which stored images have a thumbnail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailStatus {
    #[serde(default)]
    pub with_thumbnails: Vec<String>,
    #[serde(default)]
    pub without_thumbnails: Vec<String>,
    #[serde(default)]
    pub missing_originals: Vec<String>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub thumbnail_count: u32,
    #[serde(default)]
    pub missing_count: u32,
}

/// Outcome of a thumbnail generation run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailGeneration {
    #[serde(default)]
    pub processed: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub total: u32,
}

/// Outcome of deleting every thumbnail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailDeletion {
    #[serde(default)]
    pub deleted: u32,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LoginForm<'a> {
    password: &'a str,
    remember_me: bool,
}

#[derive(Debug, Serialize)]
struct MainImageForm<'a> {
    filename: &'a str,
}

// =============================================================================
// AdminClient
// =============================================================================

/// Client for the shop REST backend, used with the admin's bearer token.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl AdminClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AdminConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .user_agent(concat!("yakimoto-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                base_url: config.backend_api_url.clone(),
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

    fn authed(&self, method: reqwest::Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
    }

    /// Send a request and decode the JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await.map_err(BackendError::from_transport)?;
        let status = response.status();
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

    /// Send a mutation whose response body is only an acknowledgement.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<(), BackendError> {
        self.send::<serde_json::Value>(request).await.map(|_| ())
    }

    /// Check that the backend answers on `GET /`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), BackendError> {
        self.execute(self.inner.client.get(self.url("/"))).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange the admin password for a JWT.
    ///
    /// With `remember_me` the backend issues a 30 day token.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` for a wrong password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, password: &str, remember_me: bool) -> Result<String, BackendError> {
        let form = LoginForm {
            password,
            remember_me,
        };
        let response: LoginResponse = self
            .send(self.inner.client.post(self.url("/login")).form(&form))
            .await?;
        Ok(response.token)
    }

    // =========================================================================
    // Catalog reads
    // =========================================================================

    /// Get every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, BackendError> {
        self.send(self.inner.client.get(self.url("/products"))).await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, BackendError> {
        self.send(self.inner.client.get(self.url(&format!("/products/{id}"))))
            .await
    }

    /// Get every category, in the order the backend returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, BackendError> {
        self.send(self.inner.client.get(self.url("/categories")))
            .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create a product with its images.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the product.
    #[instrument(skip(self, token, product), fields(name = %product.name, images = product.images.len()))]
    pub async fn create_product(
        &self,
        token: &str,
        product: ProductSubmission,
    ) -> Result<(), BackendError> {
        let form = product.into_form()?;
        self.execute(
            self.authed(reqwest::Method::POST, "/products", token)
                .multipart(form),
        )
        .await
    }

    /// Replace a product's fields; new images are appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, product), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        product: ProductSubmission,
    ) -> Result<(), BackendError> {
        let form = product.into_form()?;
        self.execute(
            self.authed(reqwest::Method::PUT, &format!("/products/{id}"), token)
                .multipart(form),
        )
        .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), BackendError> {
        self.execute(self.authed(reqwest::Method::DELETE, &format!("/products/{id}"), token))
            .await
    }

    /// Make `filename` the product's main image.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the image is not the product's.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn set_main_image(
        &self,
        token: &str,
        id: ProductId,
        filename: &str,
    ) -> Result<(), BackendError> {
        self.execute(
            self.authed(
                reqwest::Method::POST,
                &format!("/products/{id}/set-main-image"),
                token,
            )
            .form(&MainImageForm { filename }),
        )
        .await
    }

    /// Delete one image of a product. The backend promotes the oldest
    /// remaining image when the main image is removed.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the image is not the product's.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_image(
        &self,
        token: &str,
        id: ProductId,
        filename: &str,
    ) -> Result<(), BackendError> {
        let path = format!("/products/{id}/images/{}", urlencoding::encode(filename));
        self.execute(self.authed(reqwest::Method::DELETE, &path, token))
            .await
    }

    /// Move stock of one size between locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the move.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn move_inventory(
        &self,
        token: &str,
        id: ProductId,
        movement: &InventoryMove,
    ) -> Result<(), BackendError> {
        self.execute(
            self.authed(
                reqwest::Method::POST,
                &format!("/products/{id}/move-inventory"),
                token,
            )
            .form(movement),
        )
        .await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Create a category, optionally with an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the category.
    #[instrument(skip(self, token, category), fields(name = %category.name))]
    pub async fn create_category(
        &self,
        token: &str,
        category: CategorySubmission,
    ) -> Result<(), BackendError> {
        let form: Form = category.into_form()?;
        self.execute(
            self.authed(reqwest::Method::POST, "/categories", token)
                .multipart(form),
        )
        .await
    }

    /// Rename a category and optionally replace its image.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, category), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        token: &str,
        id: CategoryId,
        category: CategorySubmission,
    ) -> Result<(), BackendError> {
        let form = category.into_form()?;
        self.execute(
            self.authed(reqwest::Method::PUT, &format!("/categories/{id}"), token)
                .multipart(form),
        )
        .await
    }

    /// Delete a category. The backend addresses categories by name here.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    #[instrument(skip(self, token))]
    pub async fn delete_category(&self, token: &str, name: &str) -> Result<(), BackendError> {
        let path = format!("/categories/{}", urlencoding::encode(name));
        self.execute(self.authed(reqwest::Method::DELETE, &path, token))
            .await
    }

    /// Store a new display order, as `{category_id: order}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order.
    #[instrument(skip(self, token, order), fields(categories = order.len()))]
    pub async fn reorder_categories(
        &self,
        token: &str,
        order: &BTreeMap<CategoryId, u32>,
    ) -> Result<(), BackendError> {
        let body: BTreeMap<String, u32> = order
            .iter()
            .map(|(id, position)| (id.to_string(), *position))
            .collect();
        self.execute(
            self.authed(reqwest::Method::POST, "/categories/reorder", token)
                .json(&body),
        )
        .await
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Report which images have thumbnails.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn thumbnail_status(&self, token: &str) -> Result<ThumbnailStatus, BackendError> {
        self.send(self.authed(reqwest::Method::GET, "/admin/thumbnail-status", token))
            .await
    }

    /// Generate the missing thumbnails.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn generate_thumbnails(
        &self,
        token: &str,
    ) -> Result<ThumbnailGeneration, BackendError> {
        self.send(self.authed(reqwest::Method::POST, "/admin/generate-thumbnails", token))
            .await
    }

    /// Delete every thumbnail.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_thumbnails(&self, token: &str) -> Result<ThumbnailDeletion, BackendError> {
        self.send(self.authed(reqwest::Method::POST, "/admin/delete-thumbnails", token))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_status_tolerates_missing_fields() {
        let status: ThumbnailStatus =
            serde_json::from_str(r#"{"total": 3, "thumbnail_count": 2, "with_thumbnails": ["a.jpg", "b.jpg"]}"#)
                .unwrap();
        assert_eq!(status.total, 3);
        assert_eq!(status.with_thumbnails.len(), 2);
        assert!(status.missing_originals.is_empty());
    }
}
