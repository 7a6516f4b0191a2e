//! Yakimoto Core - Shared domain library.
//!
//! This crate provides the types and pure logic used by every Yakimoto Dojo
//! shop component:
//! - `storefront` - Public catalog, cart, and checkout
//! - `admin` - Product, category, and inventory management
//! - `cli` - Session-store migrations and backend checks
//!
//! # Architecture
//!
//! The core crate contains no I/O: no HTTP clients, no database access.
//! Everything here can be unit tested without a running backend.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, emails, and stock status
//! - [`inventory`] - Per-size stock split between the online shop and the club
//! - [`pricing`] - Discount percent vs. fixed sale price rules
//! - [`catalog`] - Products and categories as returned by the backend
//! - [`cart`] - Session cart with (product, size) deduplication
//! - [`checkout`] - Customer validation, totals, and the order payload
//! - [`images`] - Upload and thumbnail URLs on the backend origin

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod images;
pub mod inventory;
pub mod pricing;
pub mod types;

pub use types::*;
