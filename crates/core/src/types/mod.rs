//! Core types for Threadline.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod id;
pub mod price;
pub mod slug;
pub mod sku;

pub use id::*;
pub use price::{Price, PriceError};
pub use sku::{Sku, SkuError};
pub use slug::{Slug, SlugError};
