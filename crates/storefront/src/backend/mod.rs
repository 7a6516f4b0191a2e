//! Client for the shop REST backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for products, categories, stock, and
//!   orders. Nothing is synced locally.
//! - Catalog reads are cached in memory via `moka`; the cache is dropped after
//!   an order is placed because the backend reduces stock on every order.
//! - Every request has a timeout. Failures are not retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use yakimoto_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let product = client.product(ProductId::new(3)).await?;
//! ```

mod cache;
mod client;

pub use client::BackendClient;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend could not be reached in time.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Build an error from a non-success response body.
    ///
    /// The backend reports errors as `{"detail": "..."}`; anything else is
    /// kept verbatim (truncated).
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body).map_or_else(
            |_| body.chars().take(200).collect(),
            |parsed| parsed.detail,
        );
        if status == StatusCode::NOT_FOUND {
            return Self::NotFound(message);
        }
        Self::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// Build an error from a failed request, separating timeouts and refused
    /// connections from other transport failures.
    #[must_use]
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_reads_detail() {
        let err = BackendError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Source and destination must be different"}"#,
        );
        assert!(matches!(
            err,
            BackendError::Api { status: 400, ref message } if message == "Source and destination must be different"
        ));
    }

    #[test]
    fn test_from_response_not_found() {
        let err = BackendError::from_response(
            StatusCode::NOT_FOUND,
            r#"{"detail": "Product not found"}"#,
        );
        assert!(matches!(err, BackendError::NotFound(ref m) if m == "Product not found"));
    }

    #[test]
    fn test_from_response_keeps_plain_body() {
        let err = BackendError::from_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "Backend returned 502: upstream down");
    }
}
