//! Integration tests for Threadline.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the storefront against a migrated database with one product
//! cargo run -p threadline-storefront
//!
//! # Run integration tests
//! cargo test -p threadline-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - Running storefront (default: `http://localhost:3000`)
//! - `TEST_PRODUCT_ID` - Existing product id used by the cart flows (default: 1)

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Product the cart tests add.
#[must_use]
pub fn test_product_id() -> i32 {
    std::env::var("TEST_PRODUCT_ID")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1)
}

/// Client that keeps the session cookie between requests, i.e. one guest.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn guest_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
