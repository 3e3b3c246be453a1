//! Product route handlers.

use axum::{Json, extract::State, http::StatusCode};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::instrument;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::CatalogEntry;
use crate::services::CatalogService;
use crate::state::AppState;
use crate::validation::ProductPayload;

/// POST /api/products
///
/// Creates the product with a generated slug and SKU.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(payload): ApiJson<ProductPayload>,
) -> Result<(StatusCode, Json<CatalogEntry>)> {
    let product = payload.into_product()?;
    let mut rng = StdRng::from_os_rng();
    let entry = CatalogService::new(state.store(), state.config().identity.max_attempts)
        .create_product(product, &mut rng)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/products/{slug}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<CatalogEntry>> {
    let entry = CatalogService::new(state.store(), state.config().identity.max_attempts)
        .show_product(&slug)
        .await?;
    Ok(Json(entry))
}
