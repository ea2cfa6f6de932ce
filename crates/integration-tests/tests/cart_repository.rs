//! `PostgreSQL` cart repository and cart manager tests.
//!
//! These tests require:
//! - A running `PostgreSQL` server reachable through `DATABASE_URL`
//!
//! `sqlx::test` creates a throwaway database per test and applies the
//! server migrations to it.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;

use marketplace_core::{Quantity, UserId};
use marketplace_integration_tests::{seed_product, seed_user, unique_username};
use marketplace_server::db::{
    CartRepository, PgCartRepository, PgCatalogStore, PgUserDirectory, RepositoryError,
    UserDirectory,
};
use marketplace_server::models::Identity;
use marketplace_server::services::{CartError, CartManager};

fn qty(n: i64) -> Quantity {
    Quantity::positive(n).expect("valid quantity")
}

fn manager(pool: &PgPool) -> CartManager {
    CartManager::new(
        Arc::new(PgCartRepository::new(pool.clone())),
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgCatalogStore::new(pool.clone())),
    )
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_get_or_create_is_idempotent(pool: PgPool) {
    let user = seed_user(&pool, &unique_username()).await;
    let repo = PgCartRepository::new(pool.clone());

    let first = repo.get_or_create(user).await.expect("create cart");
    let second = repo.get_or_create(user).await.expect("get cart");
    assert_eq!(first.id, second.id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE user_id = $1")
        .bind(user.as_i64())
        .fetch_one(&pool)
        .await
        .expect("count carts");
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_add_or_increment_merges(pool: PgPool) {
    let user = seed_user(&pool, &unique_username()).await;
    let product = seed_product(&pool, "Widget", Decimal::new(1000, 2)).await;
    let repo = PgCartRepository::new(pool);

    let first = repo
        .add_or_increment(user, product, qty(2))
        .await
        .expect("first add");
    let second = repo
        .add_or_increment(user, product, qty(3))
        .await
        .expect("second add");

    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity.get(), 5);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_add_or_increment_overflow_is_conflict(pool: PgPool) {
    let user = seed_user(&pool, &unique_username()).await;
    let product = seed_product(&pool, "Widget", Decimal::new(1000, 2)).await;
    let repo = PgCartRepository::new(pool);

    repo.add_or_increment(user, product, qty(i64::from(Quantity::MAX)))
        .await
        .expect("fill line");

    let result = repo.add_or_increment(user, product, qty(1)).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));

    let (_, items) = repo
        .find_with_items(user)
        .await
        .expect("read cart")
        .expect("cart exists");
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().map(|i| i.quantity.get()), Some(Quantity::MAX));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_set_quantity_remove_and_clear(pool: PgPool) {
    let user = seed_user(&pool, &unique_username()).await;
    let widget = seed_product(&pool, "Widget", Decimal::new(1000, 2)).await;
    let gadget = seed_product(&pool, "Gadget", Decimal::new(250, 2)).await;
    let repo = PgCartRepository::new(pool);

    assert!(
        repo.set_quantity(user, widget, qty(1))
            .await
            .expect("set without cart")
            .is_none()
    );

    repo.add_or_increment(user, widget, qty(5)).await.expect("add");
    repo.add_or_increment(user, gadget, qty(1)).await.expect("add");

    let item = repo
        .set_quantity(user, widget, qty(2))
        .await
        .expect("set")
        .expect("line exists");
    assert_eq!(item.quantity.get(), 2);

    assert!(repo.remove(user, widget).await.expect("remove"));
    assert!(!repo.remove(user, widget).await.expect("remove again"));

    assert_eq!(repo.clear(user).await.expect("clear"), 1);
    let (cart, items) = repo
        .find_with_items(user)
        .await
        .expect("read")
        .expect("cart kept");
    assert_eq!(cart.user_id, user);
    assert!(items.is_empty());
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_for_user_cascades(pool: PgPool) {
    let user = seed_user(&pool, &unique_username()).await;
    let product = seed_product(&pool, "Widget", Decimal::new(1000, 2)).await;
    let repo = PgCartRepository::new(pool.clone());
    repo.add_or_increment(user, product, qty(1)).await.expect("add");

    assert!(repo.delete_for_user(user).await.expect("delete"));
    assert!(!repo.delete_for_user(user).await.expect("delete again"));

    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items")
        .fetch_one(&pool)
        .await
        .expect("count items");
    assert_eq!(items, 0);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_deleting_user_deletes_cart(pool: PgPool) {
    let user = seed_user(&pool, &unique_username()).await;
    let product = seed_product(&pool, "Widget", Decimal::new(1000, 2)).await;
    let repo = PgCartRepository::new(pool.clone());
    repo.add_or_increment(user, product, qty(1)).await.expect("add");

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.as_i64())
        .execute(&pool)
        .await
        .expect("delete user");

    assert!(repo.find_by_user(user).await.expect("find").is_none());
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_user_directory_loads_roles(pool: PgPool) {
    let username = unique_username();
    let id = seed_user(&pool, &username).await;

    let user = PgUserDirectory::new(pool)
        .find_by_username(&username)
        .await
        .expect("lookup")
        .expect("user exists");

    assert_eq!(user.id, id);
    assert!(user.has_role(marketplace_core::Role::User));
    assert!(!user.has_role(marketplace_core::Role::Admin));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_manager_rejections_leave_no_rows(pool: PgPool) {
    let username = unique_username();
    seed_user(&pool, &username).await;
    let product = seed_product(&pool, "Widget", Decimal::new(1000, 2)).await;
    let manager = manager(&pool);
    let identity = Identity::new(username);

    let result = manager.add_item(&identity, product, 0).await;
    assert!(matches!(result, Err(CartError::InvalidArgument(_))));

    let result = manager
        .add_item(&identity, marketplace_core::ProductId::new(i64::MAX), 1)
        .await;
    assert!(matches!(result, Err(CartError::NotFound(_))));

    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_items")
        .fetch_one(&pool)
        .await
        .expect("count items");
    assert_eq!(items, 0);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_adds_accumulate(pool: PgPool) {
    const TASKS: u32 = 32;

    let username = unique_username();
    let user: UserId = seed_user(&pool, &username).await;
    let product = seed_product(&pool, "Widget", Decimal::new(1000, 2)).await;
    let manager = Arc::new(manager(&pool));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let identity = Identity::new(username.clone());
            tokio::spawn(async move { manager.add_item(&identity, product, 1).await })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task panicked").expect("add failed");
    }

    let (_, items) = PgCartRepository::new(pool)
        .find_with_items(user)
        .await
        .expect("read")
        .expect("cart exists");
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().map(|i| i.quantity.get()), Some(TASKS));
}
