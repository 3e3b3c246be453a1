//! Cart service error types.

use std::fmt;

use thiserror::Error;

use threadline_core::ProductId;

use crate::db::RepositoryError;
use crate::services::session::SessionError;
use crate::validation::ValidationErrors;

/// The cart operation that failed, as worded in "Could not ..." messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    List,
    Add,
    Update,
    Remove,
    Clear,
    Count,
    Lookup,
    Adopt,
}

impl fmt::Display for CartAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "get cart items",
            Self::Add => "add product to cart",
            Self::Update => "update cart",
            Self::Remove => "remove item from cart",
            Self::Clear => "clear cart",
            Self::Count => "count cart items",
            Self::Lookup => "find cart items",
            Self::Adopt => "merge guest cart",
        })
    }
}

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request was rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The referenced catalog entry does not exist.
    #[error("Product was not found")]
    ProductNotFound(ProductId),

    /// The referenced cart line does not exist.
    #[error("Item not found")]
    LineNotFound,

    /// The cart has no lines.
    #[error("No items in cart")]
    Empty,

    /// A persistent write failed and was rolled back.
    #[error("Could not {action}")]
    Persistence {
        action: CartAction,
        #[source]
        source: RepositoryError,
    },

    /// The session store failed.
    #[error("Could not {action}")]
    Session {
        action: CartAction,
        #[source]
        source: SessionError,
    },
}
