//! Integration test support for the marketplace server.
//!
//! # Running Tests
//!
//! ```bash
//! # Repository tests: each test gets a fresh database created from
//! # DATABASE_URL with migrations applied
//! DATABASE_URL=postgres://localhost/marketplace \
//!     cargo test -p marketplace-integration-tests -- --ignored
//!
//! # API tests additionally need a running server sharing that database
//! # and the same MARKETPLACE_JWT_SECRET
//! cargo run -p marketplace-server
//! ```
//!
//! # Test Categories
//!
//! - `cart_repository` - `PostgreSQL` repository behaviour, including concurrency
//! - `cart_api` - HTTP tests against a running server

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use marketplace_core::{ProductId, UserId, Username};

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("MARKETPLACE_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// A username no other test run has used.
///
/// # Panics
///
/// Never in practice: the generated name is always valid.
#[must_use]
pub fn unique_username() -> Username {
    let suffix = Uuid::new_v4().simple().to_string();
    let name = format!("t{}", suffix.get(..12).unwrap_or(&suffix));
    Username::parse(&name).expect("generated username is valid")
}

/// Insert a user with `ROLE_USER`.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn seed_user(pool: &PgPool, username: &Username) -> UserId {
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, 'not-a-real-hash')
        RETURNING id
        ",
    )
    .bind(username.as_str())
    .bind(format!("{username}@example.com"))
    .fetch_one(pool)
    .await
    .expect("Failed to insert user");

    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, 'ROLE_USER')")
        .bind(id)
        .execute(pool)
        .await
        .expect("Failed to insert role");

    UserId::new(id)
}

/// Insert a product, with the seller, store and category it needs.
///
/// # Panics
///
/// Panics if an insert fails.
pub async fn seed_product(pool: &PgPool, name: &str, price: Decimal) -> ProductId {
    let seller_name = unique_username();
    let owner = seed_user(pool, &seller_name).await;

    let seller_id: i64 =
        sqlx::query_scalar("INSERT INTO sellers (user_id) VALUES ($1) RETURNING id")
            .bind(owner.as_i64())
            .fetch_one(pool)
            .await
            .expect("Failed to insert seller");

    let store_id: i64 =
        sqlx::query_scalar("INSERT INTO stores (seller_id, name) VALUES ($1, $2) RETURNING id")
            .bind(seller_id)
            .bind(format!("{seller_name} store"))
            .fetch_one(pool)
            .await
            .expect("Failed to insert store");

    let category_id: i64 =
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(format!("{seller_name} category"))
            .fetch_one(pool)
            .await
            .expect("Failed to insert category");

    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO products (name, price, stock, category_id, store_id)
        VALUES ($1, $2, 100, $3, $4)
        RETURNING id
        ",
    )
    .bind(name)
    .bind(price)
    .bind(category_id)
    .bind(store_id)
    .fetch_one(pool)
    .await
    .expect("Failed to insert product");

    ProductId::new(id)
}
