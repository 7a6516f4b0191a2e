//! Session-stored admin login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session keys for admin data.
pub mod keys {
    /// Key for the logged-in admin's backend token.
    pub const ADMIN_SESSION: &str = "admin_session";

    /// Key for queued flash messages.
    pub const FLASH: &str = "flash";
}

/// The backend bearer token of a logged-in admin.
///
/// The token itself is never sent to the browser; only the session cookie is.
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub token: String,
    /// `exp` claim of the token.
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Whether the token is still accepted at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_validity_ends_at_expiry() {
        let now = Utc::now();
        let session = AdminSession {
            token: "abc.def.ghi".to_string(),
            expires_at: now + Duration::minutes(5),
        };
        assert!(session.is_valid_at(now));
        assert!(!session.is_valid_at(now + Duration::minutes(5)));
    }

    #[test]
    fn test_debug_hides_token() {
        let session = AdminSession {
            token: "secret-token".to_string(),
            expires_at: Utc::now(),
        };
        assert!(!format!("{session:?}").contains("secret-token"));
    }
}
