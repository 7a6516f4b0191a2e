//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (correlation header, span field, Sentry tag)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. CSP nonce (per-request nonce for inline scripts)
//! 6. Security headers (CSP, frame, referrer, permissions)
//! 7. Rate limiting on cart and checkout mutations (governor)

pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{cart_rate_limiter, checkout_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
