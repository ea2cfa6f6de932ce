//! HTTP tests for the cart API.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`mp-cli migrate`)
//! - The server running against it (`cargo run -p marketplace-server`)
//! - `DATABASE_URL` and `MARKETPLACE_JWT_SECRET` matching the server's
//!
//! Run with: cargo test -p marketplace-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::PgPool;

use marketplace_core::ProductId;
use marketplace_integration_tests::{api_base_url, seed_product, seed_user, unique_username};
use marketplace_server::config::JwtConfig;
use marketplace_server::services::TokenService;

struct Session {
    client: Client,
    token: String,
    product: ProductId,
}

/// Seed a fresh user and product, and issue a token for the user.
async fn session() -> Session {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let username = unique_username();
    seed_user(&pool, &username).await;
    let product = seed_product(&pool, "Widget", Decimal::new(1999, 2)).await;

    let config = JwtConfig::from_env().expect("MARKETPLACE_JWT_SECRET must be set");
    let token = TokenService::new(&config)
        .expect("valid signing key")
        .issue(&username)
        .expect("Failed to issue token");

    Session {
        client: Client::new(),
        token,
        product,
    }
}

impl Session {
    async fn add(&self, quantity: i64) -> reqwest::Response {
        self.client
            .post(format!("{}/api/cart/add", api_base_url()))
            .bearer_auth(&self.token)
            .json(&json!({ "productId": self.product, "quantity": quantity }))
            .send()
            .await
            .expect("Failed to add to cart")
    }

    async fn cart(&self) -> Value {
        let resp = self
            .client
            .get(format!("{}/api/cart", api_base_url()))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("Failed to get cart");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.expect("Failed to parse cart")
    }
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health/ready", api_base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_cart_requires_token() {
    let resp = Client::new()
        .get(format!("{}/api/cart", api_base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_first_access_creates_empty_cart() {
    let session = session().await;
    let cart = session.cart().await;
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_add_merges_and_update_overwrites() {
    let session = session().await;

    assert_eq!(session.add(2).await.status(), StatusCode::OK);
    let item: Value = session.add(3).await.json().await.expect("item body");
    assert_eq!(item["quantity"], 5);

    let resp = session
        .client
        .put(format!("{}/api/cart/update", api_base_url()))
        .bearer_auth(&session.token)
        .json(&json!({ "productId": session.product, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to update");
    assert_eq!(resp.status(), StatusCode::OK);
    let item: Value = resp.json().await.expect("item body");
    assert_eq!(item["quantity"], 2);

    let cart = session.cart().await;
    assert_eq!(cart["itemCount"], 2);
    assert_eq!(cart["subtotal"], "39.98");
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_invalid_and_missing() {
    let session = session().await;

    assert_eq!(session.add(0).await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(session.add(-1).await.status(), StatusCode::BAD_REQUEST);

    let resp = session
        .client
        .delete(format!(
            "{}/api/cart/remove/{}",
            api_base_url(),
            session.product
        ))
        .bearer_auth(&session.token)
        .send()
        .await
        .expect("Failed to remove");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(session.cart().await["items"], json!([]));
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_update_to_zero_then_clear() {
    let session = session().await;
    session.add(4).await;

    let resp = session
        .client
        .put(format!("{}/api/cart/update", api_base_url()))
        .bearer_auth(&session.token)
        .json(&json!({ "productId": session.product, "quantity": 0 }))
        .send()
        .await
        .expect("Failed to update");
    let body: Value = resp.json().await.expect("removed body");
    assert_eq!(body["status"], "removed");

    session.add(1).await;
    let resp = session
        .client
        .delete(format!("{}/api/cart/clear", api_base_url()))
        .bearer_auth(&session.token)
        .send()
        .await
        .expect("Failed to clear");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(session.cart().await["items"], json!([]));
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_concurrent_adds_over_http() {
    const REQUESTS: i64 = 20;

    let session = std::sync::Arc::new(session().await);
    let handles: Vec<_> = (0..REQUESTS)
        .map(|_| {
            let session = std::sync::Arc::clone(&session);
            tokio::spawn(async move { session.add(1).await.status() })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.expect("task panicked"), StatusCode::OK);
    }

    assert_eq!(session.cart().await["itemCount"], REQUESTS);
}
