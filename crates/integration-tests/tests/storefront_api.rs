//! Integration tests for the storefront REST API over real HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use verdant_integration_tests::TestServer;

async fn get_json(client: &reqwest::Client, server: &TestServer, path: &str) -> Value {
    let resp = client.get(server.url(path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "GET {path}");
    resp.json().await.unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let server = TestServer::start().await;
    let client = server.shopper();

    let resp = client.get(server.url("health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(server.url("health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Catalog & Content
// ============================================================================

#[tokio::test]
async fn test_catalog_endpoints() {
    let server = TestServer::start().await;
    let client = server.shopper();

    let page = get_json(&client, &server, "api/products").await;
    assert_eq!(page["total"], 13);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["products"].as_array().unwrap().len(), 12);

    let page = get_json(&client, &server, "api/products?category=planters").await;
    assert_eq!(page["total"], 2);

    let page = get_json(&client, &server, "api/products?q=LAVENDER").await;
    assert_eq!(page["products"][0]["slug"], "lavender-hidcote");

    let page = get_json(&client, &server, "api/products?sort=price-asc&per_page=1").await;
    assert_eq!(page["products"][0]["slug"], "rosemary");

    let product = get_json(&client, &server, "api/products/snake-plant").await;
    assert_eq!(product["id"], 42);
    assert_eq!(product["price"]["amount"], "10.00");

    let category = get_json(&client, &server, "api/categories/garden-care").await;
    assert_eq!(category["products"].as_array().unwrap().len(), 3);

    let resp = client
        .get(server.url("api/products/plastic-fern"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blog_and_pages() {
    let server = TestServer::start().await;
    let client = server.shopper();

    let posts = get_json(&client, &server, "api/blog").await;
    let slugs: Vec<&str> = posts
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(
        slugs,
        vec![
            "pollinator-border",
            "plants-for-low-light",
            "repotting-a-monstera"
        ]
    );

    let posts = get_json(&client, &server, "api/blog?tag=houseplants").await;
    assert_eq!(posts.as_array().unwrap().len(), 2);

    let resp = client
        .get(server.url("api/blog/pink-princess-restock"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let post = get_json(&client, &server, "api/blog/repotting-a-monstera").await;
    assert!(post["content_html"].as_str().unwrap().contains("<strong>one size</strong>"));

    let page = get_json(&client, &server, "api/pages/shipping").await;
    assert_eq!(page["title"], "Shipping");
}

// ============================================================================
// Cart & Checkout
// ============================================================================

#[tokio::test]
async fn test_carts_are_per_session() {
    let server = TestServer::start().await;
    let alice = server.shopper();
    let bob = server.shopper();

    let resp = alice
        .post(server.url("cart/items"))
        .json(&json!({"product_id": 42, "quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let alice_cart = get_json(&alice, &server, "cart").await;
    assert_eq!(alice_cart["items"].as_array().unwrap().len(), 1);

    let bob_cart = get_json(&bob, &server, "cart").await;
    assert!(bob_cart["items"].as_array().unwrap().is_empty());
    assert!(bob_cart["cart_id"].is_null());
}

#[tokio::test]
async fn test_checkout_flow() {
    let server = TestServer::start().await;
    let client = server.shopper();

    for (product_id, quantity) in [(42, 2), (80, 1)] {
        let resp = client
            .post(server.url("cart/items"))
            .json(&json!({"product_id": product_id, "quantity": quantity}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let cart = get_json(&client, &server, "cart").await;
    assert_eq!(cart["summary"]["subtotal"], "32.50");
    assert_eq!(cart["summary"]["shipping_fee"], "5.99");
    // 32.50 * 0.07 = 2.275, rounded half away from zero
    assert_eq!(cart["summary"]["tax"], "2.28");
    assert_eq!(cart["summary"]["total"], "40.77");

    let resp = client.post(server.url("checkout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();
    assert_eq!(order["summary"]["total"], "40.77");
    assert_eq!(order["cart_id"], cart["cart_id"]);

    let cart = get_json(&client, &server, "cart").await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let resp = client.post(server.url("checkout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_out_of_stock_is_conflict() {
    let server = TestServer::start().await;
    let client = server.shopper();

    let resp = client
        .post(server.url("cart/items"))
        .json(&json!({"product_id": 46, "quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("46"));
}
