//! Admin authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur while logging in.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// The backend rejected the password.
    #[error("invalid password")]
    InvalidPassword,

    /// The password field was empty.
    #[error("password is required")]
    MissingPassword,

    /// The token is not a JWT with a numeric `exp` claim.
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    /// The backend issued a token that is already expired.
    #[error("token already expired")]
    Expired,

    /// Backend request failed.
    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for AdminAuthError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized(_) => Self::InvalidPassword,
            other => Self::Backend(other),
        }
    }
}
