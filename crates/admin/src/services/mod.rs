//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password login against the backend and token expiry

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService};
