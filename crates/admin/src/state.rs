//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use yakimoto_core::images::ImageUrls;

use crate::backend::{AdminClient, BackendError};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    backend: AdminClient,
    images: ImageUrls,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, BackendError> {
        let backend = AdminClient::new(&config)?;
        let images = ImageUrls::new(backend.base_url());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                images,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Session database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn backend(&self) -> &AdminClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn images(&self) -> &ImageUrls {
        &self.inner.images
    }
}
