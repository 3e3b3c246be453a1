//! Threadline Core - Shared types library.
//!
//! This crate provides common types used across all Threadline components:
//! - `storefront` - Cart and catalog JSON API
//! - `cli` - Command-line tools for migrations and cart reports
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, slugs and SKUs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
