//! Data kept in the visitor's session.

pub mod session;

pub use session::{LastOrder, keys as session_keys, load_cart, save_cart};
