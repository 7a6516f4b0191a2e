//! CLI command implementations.

pub mod backend;
pub mod migrate;
