//! Authentication middleware and extractors for admin.
//!
//! The admin is logged in while the session holds an [`AdminSession`] whose
//! token has not passed its `exp`.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::error::TokenRejected;
use crate::flash::{self, Flash};
use crate::models::{AdminSession, session_keys};

/// Extractor that requires a logged-in admin.
///
/// Redirects to the login page when there is no session token or when the
/// token has expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     state.backend().delete_product(&admin.token, id).await
/// }
/// ```
pub struct RequireAdminAuth(pub AdminSession);

/// Error returned when admin authentication is required but missing.
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to("/auth/login").into_response()
    }
}

/// Read the session's admin login, if it is still valid.
async fn current_admin(session: &Session) -> Option<AdminSession> {
    session
        .get::<AdminSession>(session_keys::ADMIN_SESSION)
        .await
        .ok()
        .flatten()
        .filter(|admin| admin.is_valid_at(Utc::now()))
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = RedirectToLogin;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(RedirectToLogin)?;
        current_admin(session).await.map(Self).ok_or(RedirectToLogin)
    }
}

/// Extractor that optionally gets the logged-in admin.
pub struct OptionalAdminAuth(pub Option<AdminSession>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => current_admin(session).await,
            None => None,
        };
        Ok(Self(admin))
    }
}

/// Helper to store the admin login in the session.
///
/// The session ID is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_admin_session(
    session: &Session,
    admin: &AdminSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::ADMIN_SESSION, admin).await
}

/// Helper to clear the admin login from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_admin_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<AdminSession>(session_keys::ADMIN_SESSION)
        .await?;
    Ok(())
}

/// Log the admin out when a handler reports that the backend rejected the
/// token.
pub async fn token_rejection_middleware(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.extensions().get::<TokenRejected>().is_some() {
        if let Err(e) = clear_admin_session(&session).await {
            tracing::warn!("Failed to clear rejected admin token: {e}");
        }
        if let Err(e) = flash::push(
            &session,
            Flash::error("Sessionen har gått ut. Logga in igen."),
        )
        .await
        {
            tracing::warn!("Failed to queue session expiry message: {e}");
        }
    }
    response
}
