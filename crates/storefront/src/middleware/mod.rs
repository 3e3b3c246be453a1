//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Path normalization (trailing slashes, wraps the whole router)
//! 2. Sentry layer (capture errors)
//! 3. `TraceLayer` (request tracing)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Shopper identity is read from the session per handler through the
//! extractors in [`auth`].

pub mod auth;
pub mod session;

pub use auth::{AuthRejection, OptionalAuth, RequireAdmin, RequireAuth};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
