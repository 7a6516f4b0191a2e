//! HTTP middleware stack for the admin panel.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Token rejection (drops a token the backend refused)
//! 5. Security headers (CSP, frame, referrer, no-store)

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAdminAuth, RequireAdminAuth, clear_admin_session, set_admin_session,
    token_rejection_middleware,
};
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
