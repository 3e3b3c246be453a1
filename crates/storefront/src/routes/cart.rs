//! Cart route handlers.
//!
//! Every handler goes through [`CartService`], which serves guests from the
//! session and signed-in shoppers from `PostgreSQL`.

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use threadline_core::{CartLineId, ProductId};

use crate::db::PgStore;
use crate::error::{Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{CartLine, CartSummary};
use crate::services::{CartService, UpdateOutcome};
use crate::state::AppState;
use crate::validation::{CartLinePayload, QuantityPayload};

/// Response body of the update endpoints.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<CartSummary>,
}

impl From<UpdateOutcome> for UpdateResponse {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Updated(cart) => Self {
                message: "Cart updated successfully",
                cart: Some(cart),
            },
            UpdateOutcome::NoChange => Self {
                message: "No changes detected",
                cart: None,
            },
        }
    }
}

fn service<'a>(state: &'a AppState, session: &'a Session) -> CartService<'a, PgStore, Session> {
    CartService::new(state.store(), session).with_policy(state.config().cart.add_policy)
}

/// GET /api/cart
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Json<CartSummary>> {
    let cart = service(&state, &session).list(auth.shopper()).await?;
    Ok(Json(cart))
}

/// POST /api/cart
#[instrument(skip(state, session, auth, payload))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    ApiJson(payload): ApiJson<CartLinePayload>,
) -> Result<Json<CartSummary>> {
    let request = payload.into_add()?;
    let product_id = request.product_id.to_string();
    add_breadcrumb("cart", "Added product", Some(&[("product_id", product_id.as_str())][..]));

    let cart = service(&state, &session).add(auth.shopper(), request).await?;
    Ok(Json(cart))
}

/// PUT /api/cart/{id}
///
/// `id` is the product id for signed-in shoppers and the line key for guests.
#[instrument(skip(state, session, auth, payload))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CartLinePayload>,
) -> Result<Json<UpdateResponse>> {
    let request = payload.into_update()?;
    let outcome = service(&state, &session)
        .update(auth.shopper(), id, request)
        .await?;
    Ok(Json(outcome.into()))
}

/// PATCH /api/cart/{id}/quantity
#[instrument(skip(state, session, auth, payload))]
pub async fn update_quantity(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<CartLineId>,
    ApiJson(payload): ApiJson<QuantityPayload>,
) -> Result<Json<UpdateResponse>> {
    let quantity = payload.into_quantity()?;
    let outcome = service(&state, &session)
        .update_quantity(auth.shopper(), id, quantity)
        .await?;
    Ok(Json(outcome.into()))
}

/// DELETE /api/cart/{id}
#[instrument(skip(state, session, auth))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<CartLineId>,
) -> Result<Json<CartSummary>> {
    let cart = service(&state, &session).remove(auth.shopper(), id).await?;
    Ok(Json(cart))
}

/// DELETE /api/cart
#[instrument(skip(state, session, auth))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Json<Value>> {
    service(&state, &session).clear(auth.shopper()).await?;
    Ok(Json(json!({ "message": "Cart cleared" })))
}

/// GET /api/cart/count
#[instrument(skip(state, session, auth))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Json<u64>> {
    let count = service(&state, &session).line_count(auth.shopper()).await?;
    Ok(Json(count))
}

/// GET /api/cart/exists/{id}
///
/// A non-numeric id is simply not in the cart.
#[instrument(skip(state, session, auth))]
pub async fn exists(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<bool>> {
    let found = service(&state, &session)
        .item_exists(auth.shopper(), &id)
        .await?;
    Ok(Json(found))
}

/// GET /api/cart/product/{id}
#[instrument(skip(state, session, auth))]
pub async fn product_lines(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Vec<CartLine>>> {
    let lines = service(&state, &session)
        .lines_for_product(auth.shopper(), id)
        .await?;
    Ok(Json(lines))
}

/// POST /api/cart/adopt
///
/// Called once sign-in has stored the user in the session.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn adopt(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartSummary>> {
    add_breadcrumb("cart", "Merging guest cart", None);
    let cart = service(&state, &session).adopt_guest_cart(user.id).await?;
    Ok(Json(cart))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_update_response_bodies() {
        let updated = UpdateResponse::from(UpdateOutcome::Updated(CartSummary {
            cart_items: Vec::new(),
            total: Decimal::ZERO,
        }));
        let body = serde_json::to_value(&updated).unwrap_or_default();
        assert_eq!(body["message"], "Cart updated successfully");
        assert_eq!(body["cart"]["cartItems"], json!([]));

        let unchanged = UpdateResponse::from(UpdateOutcome::NoChange);
        let body = serde_json::to_value(&unchanged).unwrap_or_default();
        assert_eq!(body, json!({ "message": "No changes detected" }));
    }
}
