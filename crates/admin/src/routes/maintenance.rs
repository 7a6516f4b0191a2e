//! Image maintenance: thumbnail status, generation, and cleanup.
//!
//! The backend does the work; these pages only trigger it and report.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use super::failure_message;
use crate::backend::{ThumbnailDeletion, ThumbnailGeneration, ThumbnailStatus};
use crate::error::Result;
use crate::filters;
use crate::flash::{self, Flash};
use crate::layout::Layout;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Errors listed in a flash before the rest are summarized.
const MAX_LISTED_ERRORS: usize = 3;

/// Maintenance page template.
#[derive(Template, WebTemplate)]
#[template(path = "maintenance.html")]
pub struct MaintenanceTemplate {
    pub layout: Layout,
    pub status: ThumbnailStatus,
}

fn with_errors(summary: String, errors: &[String]) -> Flash {
    if errors.is_empty() {
        return Flash::success(summary);
    }
    let mut listed: Vec<&str> = errors
        .iter()
        .take(MAX_LISTED_ERRORS)
        .map(String::as_str)
        .collect();
    let more = errors.len().saturating_sub(MAX_LISTED_ERRORS);
    let more_note = format!("och {more} till");
    if more > 0 {
        listed.push(&more_note);
    }
    Flash::error(format!("{summary} Fel: {}", listed.join("; ")))
}

fn generation_flash(run: &ThumbnailGeneration) -> Flash {
    with_errors(
        format!(
            "{} miniatyrer skapades, {} hoppades över (av {}).",
            run.processed, run.skipped, run.total
        ),
        &run.errors,
    )
}

fn deletion_flash(run: &ThumbnailDeletion) -> Flash {
    with_errors(format!("{} miniatyrer togs bort.", run.deleted), &run.errors)
}

/// Show which images have thumbnails.
#[instrument(skip(state, session, admin))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<impl IntoResponse> {
    let status = state.backend().thumbnail_status(&admin.token).await?;
    Ok(MaintenanceTemplate {
        layout: Layout::build(&session, "Underhåll", "/maintenance").await,
        status,
    })
}

/// Generate missing thumbnails.
#[instrument(skip(state, session, admin))]
pub async fn generate(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<Redirect> {
    let message = match state.backend().generate_thumbnails(&admin.token).await {
        Ok(run) => {
            tracing::info!(processed = run.processed, errors = run.errors.len(), "Thumbnails generated");
            generation_flash(&run)
        }
        Err(e) => Flash::error(failure_message(e)?),
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to("/maintenance"))
}

/// Delete every thumbnail.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<Redirect> {
    let message = match state.backend().delete_thumbnails(&admin.token).await {
        Ok(run) => {
            tracing::info!(deleted = run.deleted, "Thumbnails deleted");
            deletion_flash(&run)
        }
        Err(e) => Flash::error(failure_message(e)?),
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to("/maintenance"))
}
