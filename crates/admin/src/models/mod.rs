//! Data kept in the admin's session.

pub mod session;

pub use session::{AdminSession, keys as session_keys};
