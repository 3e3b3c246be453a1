//! Integration tests for the guest cart API.
//!
//! These tests require:
//! - A running `PostgreSQL` database migrated with `tl-cli migrate`
//! - The storefront server running (cargo run -p threadline-storefront)
//! - A product with id `TEST_PRODUCT_ID`

use reqwest::StatusCode;
use serde_json::{Value, json};

use threadline_integration_tests::{guest_client, storefront_base_url, test_product_id};

fn shirt_line(quantity: u32) -> Value {
    json!({
        "product_id": test_product_id(),
        "quantity": quantity,
        "size": ["M"],
        "color": ["#ff0000"],
    })
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = guest_client()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_new_guest_has_empty_cart() {
    let client = guest_client();
    let base_url = storefront_base_url();

    let body: Value = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(body["cartItems"], json!([]));

    let count: u64 = client
        .get(format!("{base_url}/api/cart/count"))
        .send()
        .await
        .expect("Failed to count cart")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and a seeded product"]
async fn test_guest_cart_flow() {
    let client = guest_client();
    let base_url = storefront_base_url();
    let product_id = test_product_id();

    // Add twice: guest lines are never merged
    for quantity in [2, 1] {
        let resp = client
            .post(format!("{base_url}/api/cart"))
            .json(&shirt_line(quantity))
            .send()
            .await
            .expect("Failed to add to cart");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let body: Value = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid JSON");
    let items = body["cartItems"].as_array().expect("cartItems array");
    assert_eq!(items.len(), 2);

    let exists: bool = client
        .get(format!("{base_url}/api/cart/exists/{product_id}"))
        .send()
        .await
        .expect("Failed to check cart")
        .json()
        .await
        .expect("Invalid JSON");
    assert!(exists);

    // Line keys start at 0
    let resp = client
        .patch(format!("{base_url}/api/cart/0/quantity"))
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .expect("Failed to update quantity");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(body["message"], "Cart updated successfully");

    let resp = client
        .patch(format!("{base_url}/api/cart/0/quantity"))
        .json(&json!({ "quantity": 5 }))
        .send()
        .await
        .expect("Failed to update quantity");
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(body["message"], "No changes detected");

    let resp = client
        .delete(format!("{base_url}/api/cart/1"))
        .send()
        .await
        .expect("Failed to remove line");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(body["cartItems"].as_array().map(Vec::len), Some(1));

    let resp = client
        .delete(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to clear cart");
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(body["message"], "Cart cleared");

    let resp = client
        .get(format!("{base_url}/api/cart/product/{product_id}"))
        .send()
        .await
        .expect("Failed to get product lines");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_add_rejects_invalid_payload() {
    let resp = guest_client()
        .post(format!("{}/api/cart", storefront_base_url()))
        .json(&json!({ "product_id": "abc", "quantity": 0, "size": [], "color": ["blue"] }))
        .send()
        .await
        .expect("Failed to add to cart");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert!(body["errors"]["product_id"].is_array());
    assert!(body["errors"]["quantity"].is_array());
    assert!(body["errors"]["color"].is_array());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_guest_line_is_not_found() {
    let resp = guest_client()
        .put(format!("{}/api/cart/42", storefront_base_url()))
        .json(&json!({ "quantity": 1, "size": ["M"], "color": ["#fff"] }))
        .send()
        .await
        .expect("Failed to update cart");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_adopt_requires_sign_in() {
    let resp = guest_client()
        .post(format!("{}/api/cart/adopt", storefront_base_url()))
        .send()
        .await
        .expect("Failed to adopt cart");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(body["message"], "Unauthenticated");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_product_creation_requires_sign_in() {
    let resp = guest_client()
        .post(format!("{}/api/products", storefront_base_url()))
        .json(&json!({ "product_name": "Shirt" }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_slug() {
    let resp = guest_client()
        .get(format!("{}/api/products/no-such-product-slug", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
