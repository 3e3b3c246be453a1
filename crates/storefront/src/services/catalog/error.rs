//! Catalog service error types.

use thiserror::Error;

use threadline_core::{SkuError, SlugError};

use crate::db::RepositoryError;
use crate::validation::ValidationErrors;

/// Errors that can occur while generating catalog identities.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The product name yields no usable slug.
    #[error("invalid product name: {0}")]
    InvalidName(#[from] SlugError),

    /// The generated SKU is not storable.
    #[error("invalid sku: {0}")]
    InvalidSku(#[from] SkuError),

    /// No unique candidate was found within the attempt bound.
    #[error("no unique {field} found after {attempts} attempts")]
    RetryExhausted { field: &'static str, attempts: u32 },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request was rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Slug or SKU generation failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// No catalog entry matches.
    #[error("Product not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
