//! Admin authentication service.
//!
//! The backend owns the password and signs the tokens. The admin panel only
//! reads the `exp` claim so that an expired token counts as logged out before
//! the backend has to reject it; the signature is the backend's business.

mod error;

pub use error::AdminAuthError;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::backend::AdminClient;
use crate::models::AdminSession;

#[derive(Debug, Deserialize)]
struct Claims {
    // Python issuers write fractional seconds
    exp: f64,
}

/// Read the `exp` claim of a JWT without verifying it.
///
/// # Errors
///
/// Returns `AdminAuthError::MalformedToken` if the token does not have three
/// segments, the payload is not base64url JSON, or `exp` is missing or not a
/// finite number. Fractional seconds are truncated.
pub fn token_expiry(token: &str) -> Result<DateTime<Utc>, AdminAuthError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AdminAuthError::MalformedToken("expected three segments")),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| AdminAuthError::MalformedToken("payload is not base64url"))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|_| AdminAuthError::MalformedToken("payload has no numeric exp"))?;
    if !claims.exp.is_finite() {
        return Err(AdminAuthError::MalformedToken("exp is not finite"));
    }
    // Saturates for huge values, which `from_timestamp` then rejects
    #[allow(clippy::cast_possible_truncation)]
    let seconds = claims.exp.floor() as i64;
    DateTime::from_timestamp(seconds, 0).ok_or(AdminAuthError::MalformedToken("exp out of range"))
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    backend: &'a AdminClient,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(backend: &'a AdminClient) -> Self {
        Self { backend }
    }

    /// Log in with the shop password.
    ///
    /// With `remember_me` the backend issues a 30 day token instead of the
    /// default lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidPassword` if the backend rejects the
    /// password, or `MalformedToken`/`Expired` if its token is unusable.
    pub async fn login(
        &self,
        password: &str,
        remember_me: bool,
    ) -> Result<AdminSession, AdminAuthError> {
        if password.is_empty() {
            return Err(AdminAuthError::MissingPassword);
        }
        let token = self.backend.login(password, remember_me).await?;
        session_for(token, Utc::now())
    }
}

/// Wrap a freshly issued token, rejecting one that is already expired.
fn session_for(token: String, now: DateTime<Utc>) -> Result<AdminSession, AdminAuthError> {
    let expires_at = token_expiry(&token)?;
    let session = AdminSession { token, expires_at };
    if !session.is_valid_at(now) {
        return Err(AdminAuthError::Expired);
    }
    Ok(session)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_token_expiry_reads_exp() {
        let expiry = token_expiry(&jwt(r#"{"sub":"admin","exp":1767225600}"#)).unwrap();
        assert_eq!(expiry.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_token_expiry_floors_fractional_exp() {
        let expiry = token_expiry(&jwt(r#"{"sub":"admin","exp":1767225600.482913}"#)).unwrap();
        assert_eq!(expiry.timestamp(), 1_767_225_600);

        let now = DateTime::from_timestamp(1_767_225_000, 0).unwrap();
        let session = session_for(jwt(r#"{"exp":1767225600.5}"#), now).unwrap();
        assert!(session.is_valid_at(now));
    }

    #[test]
    fn test_token_expiry_rejects_out_of_range_exp() {
        assert!(matches!(
            token_expiry(&jwt(r#"{"exp":1e300}"#)),
            Err(AdminAuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_token_expiry_rejects_garbage() {
        assert!(matches!(
            token_expiry("not-a-jwt"),
            Err(AdminAuthError::MalformedToken(_))
        ));
        assert!(matches!(
            token_expiry(&jwt(r#"{"sub":"admin"}"#)),
            Err(AdminAuthError::MalformedToken(_))
        ));
        assert!(matches!(
            token_expiry("a.!!!.c"),
            Err(AdminAuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_expired_token_is_refused() {
        let now = DateTime::from_timestamp(1_767_225_601, 0).unwrap();
        let err = session_for(jwt(r#"{"exp":1767225600}"#), now).unwrap_err();
        assert!(matches!(err, AdminAuthError::Expired));

        let earlier = DateTime::from_timestamp(1_767_225_000, 0).unwrap();
        let session = session_for(jwt(r#"{"exp":1767225600}"#), earlier).unwrap();
        assert!(session.is_valid_at(earlier));
    }
}
