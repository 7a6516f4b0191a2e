//! HTTP route handlers for the admin panel.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Redirect to products
//! GET  /health                            - Liveness check
//! GET  /health/ready                      - Readiness check (database + backend)
//!
//! # Auth
//! GET  /auth/login                        - Login page
//! POST /auth/login                        - Log in with the shop password
//! POST /auth/logout                       - Log out
//!
//! # Products
//! GET  /products                          - Product list with stock per location
//! GET  /products/new                      - Create form
//! POST /products                          - Create (multipart)
//! GET  /products/{id}/edit                - Edit form
//! POST /products/{id}                     - Update (multipart)
//! POST /products/{id}/delete              - Delete
//! POST /products/{id}/main-image          - Set main image
//! POST /products/{id}/images/delete       - Delete one image
//! POST /products/{id}/move-inventory      - Move stock between locations
//!
//! # Categories
//! GET  /categories                        - Category list
//! POST /categories                        - Create (multipart)
//! POST /categories/reorder                - Save display order
//! POST /categories/{id}                   - Update (multipart)
//! POST /categories/{id}/delete            - Delete
//!
//! # Maintenance
//! GET  /maintenance                       - Thumbnail status
//! POST /maintenance/thumbnails/generate   - Generate missing thumbnails
//! POST /maintenance/thumbnails/delete     - Delete all thumbnails
//! ```

pub mod auth;
pub mod categories;
pub mod maintenance;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::backend::BackendError;
use crate::error::AppError;
use crate::state::AppState;
use crate::uploads::MAX_UPLOAD_BYTES;

/// Message for a backend mutation that failed.
///
/// Validation failures carry the backend's own text; other failures are
/// logged and summarized. A rejected token is not a message: it ends the
/// session.
///
/// # Errors
///
/// Returns `AppError::SessionExpired` when the backend refused the token.
pub fn failure_message(err: BackendError) -> Result<String, AppError> {
    if let BackendError::Unauthorized(_) = err {
        return Err(AppError::SessionExpired);
    }
    if let Some(message) = err.client_message() {
        return Ok(message.to_string());
    }
    tracing::error!(error = %err, "Backend mutation failed");
    Ok(match err {
        BackendError::Unavailable(_) => "Backend svarar inte. Försök igen om en stund.",
        _ => "Något gick fel i backend. Försök igen.",
    }
    .to_string())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    let uploads = Router::new()
        .route("/", post(products::create))
        .route("/{id}", post(products::update))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .route("/", get(products::index))
        .route("/new", get(products::new_form))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/delete", post(products::delete))
        .route("/{id}/main-image", post(products::set_main_image))
        .route("/{id}/images/delete", post(products::delete_image))
        .route("/{id}/move-inventory", post(products::move_inventory))
        .merge(uploads)
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    let uploads = Router::new()
        .route("/", post(categories::create))
        .route("/{id}", post(categories::update))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .route("/", get(categories::index))
        .route("/reorder", post(categories::reorder))
        .route("/{id}/delete", post(categories::delete))
        .merge(uploads)
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .route("/maintenance", get(maintenance::show))
        .route(
            "/maintenance/thumbnails/generate",
            post(maintenance::generate),
        )
        .route("/maintenance/thumbnails/delete", post(maintenance::delete))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message() {
        assert!(matches!(
            failure_message(BackendError::Unauthorized(403)),
            Err(AppError::SessionExpired)
        ));
        assert_eq!(
            failure_message(BackendError::Api {
                status: 400,
                message: "Category already exists".to_string()
            })
            .ok()
            .as_deref(),
            Some("Category already exists")
        );
        assert_eq!(
            failure_message(BackendError::Api {
                status: 500,
                message: "Traceback".to_string()
            })
            .ok()
            .as_deref(),
            Some("Något gick fel i backend. Försök igen.")
        );
    }
}
