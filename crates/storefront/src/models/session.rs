//! Session-related types.
//!
//! Types stored in the session for shopper identity and the guest cart.

use serde::{Deserialize, Serialize};

use threadline_core::UserId;

use super::cart::Shopper;

/// Session-stored user identity.
///
/// Written by the sign-in flow (outside this crate); read here to decide which
/// cart backend serves the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Whether the user may manage the catalog.
    #[serde(default)]
    pub is_admin: bool,
}

impl From<Option<&CurrentUser>> for Shopper {
    fn from(user: Option<&CurrentUser>) -> Self {
        user.map_or(Self::Guest, |u| Self::Authenticated(u.id))
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart.
    pub const GUEST_CART: &str = "guest_cart";
}
