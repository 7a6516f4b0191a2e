//! Authenticated client for the shop REST backend.
//!
//! # Architecture
//!
//! - Reads (`/products`, `/categories`) are public; every mutation carries the
//!   admin's bearer token from the session.
//! - Nothing is cached: after a mutation the route redirects and the list is
//!   fetched again.
//! - A 401 or 403 becomes [`BackendError::Unauthorized`], which the route
//!   layer turns into a logout and a redirect to the login page.
//! - Failures are not retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use yakimoto_admin::backend::AdminClient;
//!
//! let client = AdminClient::new(&config)?;
//! let token = client.login("hunter2", true).await?;
//! client.delete_product(&token, ProductId::new(3)).await?;
//! ```

mod client;
mod forms;

pub use client::{AdminClient, ThumbnailDeletion, ThumbnailGeneration, ThumbnailStatus};
pub use forms::{CategorySubmission, InventoryMove, ProductSubmission, Upload};

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

    /// The bearer token was missing, expired, or rejected (401/403).
    #[error("Unauthorized ({0})")]
    Unauthorized(u16),
}

impl BackendError {
    /// Build an error from a non-success response body.
    ///
    /// The backend reports errors as `{"detail": "..."}`; anything else is
    /// kept verbatim (truncated).
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Self::Unauthorized(status.as_u16());
        }
        let message = serde_json::from_str::<ErrorBody>(body).map_or_else(
            |_| body.chars().take(200).collect(),
            |parsed| parsed.detail.into_message(),
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

    /// Message the backend gave for a rejected request, if it is safe to show
    /// to the admin (validation failures such as insufficient stock).
    #[must_use]
    pub fn client_message(&self) -> Option<&str> {
        match self {
            Self::Api { status, message } if (400..500).contains(status) => Some(message),
            Self::NotFound(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Detail,
}

/// `detail` is a string for handled errors and a list of field problems for
/// request validation failures.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Fields(Vec<FieldProblem>),
}

#[derive(Debug, Deserialize)]
struct FieldProblem {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

impl Detail {
    fn into_message(self) -> String {
        match self {
            Self::Message(message) => message,
            Self::Fields(problems) => problems
                .into_iter()
                .map(|p| match p.loc.last().and_then(serde_json::Value::as_str) {
                    Some(field) => format!("{field}: {}", p.msg),
                    None => p.msg,
                })
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_statuses() {
        assert!(matches!(
            BackendError::from_response(StatusCode::UNAUTHORIZED, r#"{"detail": "Invalid token"}"#),
            BackendError::Unauthorized(401)
        ));
        assert!(matches!(
            BackendError::from_response(StatusCode::FORBIDDEN, ""),
            BackendError::Unauthorized(403)
        ));
    }

    #[test]
    fn test_detail_message_is_kept() {
        let err = BackendError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Insufficient stock at club: 1 available, 3 requested"}"#,
        );
        assert_eq!(
            err.client_message(),
            Some("Insufficient stock at club: 1 available, 3 requested")
        );
    }

    #[test]
    fn test_validation_detail_is_flattened() {
        let err = BackendError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "price"], "msg": "field required", "type": "missing"}]}"#,
        );
        assert_eq!(err.client_message(), Some("price: field required"));
    }

    #[test]
    fn test_server_errors_are_not_shown() {
        let err = BackendError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "Traceback ...");
        assert_eq!(err.client_message(), None);
    }
}
