//! Domain models for the storefront.
//!
//! These are validated domain types, separate from the database row types in
//! [`crate::db`] and the raw JSON payloads in [`crate::validation`].

pub mod cart;
pub mod catalog;
pub mod session;

pub use cart::{
    AddToCart, CartLine, CartSummary, GuestCart, LineChanges, MAX_LINE_QUANTITY, NewCartLine,
    Shopper, UpdateLine, normalize_tokens,
};
pub use catalog::{CatalogEntry, NewCatalogEntry, NewProduct};
pub use session::{CurrentUser, keys as session_keys};
