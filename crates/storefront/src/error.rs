//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every response body is JSON with a `message` field; validation failures
//! add the per-field `errors` map.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{CartError, CatalogError, IdentityError, SessionError};
use crate::validation::ValidationErrors;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Request body rejected.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Cart(CartError::Validation(_))
            | Self::Catalog(
                CatalogError::Validation(_)
                | CatalogError::Identity(IdentityError::InvalidName(_) | IdentityError::InvalidSku(_)),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_)
            | Self::Cart(CartError::ProductNotFound(_) | CartError::LineNotFound | CartError::Empty)
            | Self::Catalog(CatalogError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(_)
            | Self::Session(_)
            | Self::Internal(_)
            | Self::Cart(CartError::Persistence { .. } | CartError::Session { .. })
            | Self::Catalog(CatalogError::Identity(_) | CatalogError::Repository(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors)
            | Self::Cart(CartError::Validation(errors))
            | Self::Catalog(CatalogError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }

    /// Client-facing message. Cart failures already read "Could not ...";
    /// everything else that is a server fault stays generic.
    fn message(&self) -> String {
        match self {
            Self::Validation(errors)
            | Self::Cart(CartError::Validation(errors))
            | Self::Catalog(CatalogError::Validation(errors)) => errors
                .first_message()
                .unwrap_or("Invalid inputs")
                .to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Catalog(CatalogError::Identity(
                err @ (IdentityError::InvalidName(_) | IdentityError::InvalidSku(_)),
            )) => err.to_string(),
            Self::Catalog(CatalogError::NotFound) | Self::NotFound(_) => self.to_string(),
            Self::Database(_)
            | Self::Session(_)
            | Self::Internal(_)
            | Self::Catalog(CatalogError::Identity(_) | CatalogError::Repository(_)) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = self.message();
        let body = match self.validation_errors() {
            Some(errors) => json!({ "message": message, "errors": errors }),
            None => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use threadline_core::{ProductId, SlugError};

    use super::*;
    use crate::services::CartAction;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_validation_status() {
        let errors = ValidationErrors::single("quantity", "Select the correct quantity");
        assert_eq!(
            get_status(AppError::Validation(errors.clone())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(CartError::Validation(errors).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(CatalogError::Identity(IdentityError::InvalidName(SlugError::Empty)).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::ProductNotFound(ProductId::new(9)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(CartError::LineNotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(get_status(CartError::Empty.into()), StatusCode::NOT_FOUND);
        assert_eq!(get_status(CatalogError::NotFound.into()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_server_error_status() {
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(
                CartError::Persistence {
                    action: CartAction::Add,
                    source: RepositoryError::NotFound,
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(
                CatalogError::Identity(IdentityError::RetryExhausted {
                    field: "slug",
                    attempts: 25,
                })
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_hide_internals() {
        let err: AppError = CartError::Persistence {
            action: CartAction::Clear,
            source: RepositoryError::DataCorruption("bad row".to_string()),
        }
        .into();
        assert_eq!(err.message(), "Could not clear cart");

        let err = AppError::Database(RepositoryError::DataCorruption("bad row".to_string()));
        assert_eq!(err.message(), "Internal server error");

        let err: AppError = ValidationErrors::single("color", "Select the correct color").into();
        assert_eq!(err.message(), "Select the correct color");
        assert!(err.validation_errors().is_some());
    }

    #[test]
    fn test_cart_validation_message_names_the_field_problem() {
        let errors = ValidationErrors::single("quantity", "Select the correct quantity");
        let err: AppError = CartError::Validation(errors).into();
        assert_eq!(err.message(), "Select the correct quantity");
        assert!(err.validation_errors().is_some());
    }
}
