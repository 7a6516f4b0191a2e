//! Authentication route handlers for admin.
//!
//! One shared shop password, checked by the backend. The token it returns is
//! kept in the server-side session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::flash::{self, Flash};
use crate::middleware::{OptionalAdminAuth, clear_admin_session, set_admin_session};
use crate::services::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<Flash>,
    pub error: Option<String>,
    pub remember_me: bool,
}

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
    /// Checkbox: present when ticked
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("password", &"[REDACTED]")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Render the login page, or go straight to the products when logged in.
#[instrument(skip_all)]
pub async fn login_page(
    session: Session,
    OptionalAdminAuth(admin): OptionalAdminAuth,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/products").into_response();
    }
    LoginTemplate {
        flashes: flash::take(&session).await,
        error: None,
        remember_me: false,
    }
    .into_response()
}

/// Exchange the password for a backend token.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let remember_me = form.remember_me.is_some();
    let service = AdminAuthService::new(state.backend());

    let error = match service.login(&form.password, remember_me).await {
        Ok(admin) => {
            set_admin_session(&session, &admin).await?;
            tracing::info!(expires_at = %admin.expires_at, remember_me, "Admin logged in");
            return Ok(Redirect::to("/products").into_response());
        }
        Err(AdminAuthError::InvalidPassword) => {
            tracing::warn!("Admin login with wrong password");
            "Fel lösenord."
        }
        Err(AdminAuthError::MissingPassword) => "Ange lösenordet.",
        Err(AdminAuthError::Backend(e)) => return Err(AppError::from(e)),
        Err(e @ (AdminAuthError::MalformedToken(_) | AdminAuthError::Expired)) => {
            return Err(AppError::Internal(e.to_string()));
        }
    };

    Ok(LoginTemplate {
        flashes: Vec::new(),
        error: Some(error.to_string()),
        remember_me,
    }
    .into_response())
}

/// Logout and clear the token.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_admin_session(&session).await?;
    flash::push(&session, Flash::success("Du är utloggad.")).await?;
    Ok(Redirect::to("/auth/login"))
}
