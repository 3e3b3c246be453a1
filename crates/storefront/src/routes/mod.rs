//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /health/ready           - Database readiness
//!
//! # Cart (guest or signed-in, JSON)
//! GET    /api/cart                 - Lines and total
//! POST   /api/cart                 - Add a product
//! DELETE /api/cart                 - Remove every line
//! GET    /api/cart/count           - Number of lines
//! GET    /api/cart/exists/{id}     - Whether a product is in the cart
//! GET    /api/cart/product/{id}    - Lines for one product
//! PUT    /api/cart/{id}            - Replace quantity, size and color
//! PATCH  /api/cart/{id}/quantity   - Set the quantity
//! DELETE /api/cart/{id}            - Remove one line
//! POST   /api/cart/adopt           - Merge the session cart after sign-in (requires auth)
//!
//! # Products
//! POST /api/products           - Create product (requires admin)
//! GET  /api/products/{slug}    - Product detail
//! ```

pub mod cart;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post, put},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/exists/{id}", get(cart::exists))
        .route("/product/{id}", get(cart::product_lines))
        .route("/adopt", post(cart::adopt))
        .route("/{id}", put(cart::update).delete(cart::remove))
        .route("/{id}/quantity", patch(cart::update_quantity))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::create))
        .route("/{slug}", get(products::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/cart", cart_routes())
        .nest("/api/products", product_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
