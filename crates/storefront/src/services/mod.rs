//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Guest and signed-in carts behind one API
//! - `catalog` - Product creation with unique slug/SKU generation
//! - `session` - Session-scoped key/value port
//! - `store` - Persistence ports implemented by `crate::db`

pub mod cart;
pub mod catalog;
pub mod session;
pub mod store;

pub use cart::{AddPolicy, CartAction, CartError, CartService, UpdateOutcome};
pub use catalog::{CatalogError, CatalogService, IdentityError, IdentityGenerator};
pub use session::{MemorySession, SessionError, SessionStore};
pub use store::{CartStore, CartTransaction, CatalogStore};
