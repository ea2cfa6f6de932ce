//! Database access for the marketplace `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users`, `user_roles` - Accounts and their roles (read through [`UserDirectory`])
//! - `sellers`, `stores`, `categories`, `products` - Catalog (read through [`CatalogStore`])
//! - `carts` - One row per user, unique on `user_id`
//! - `cart_items` - Line items, unique on `(cart_id, product_id)`
//!
//! Each repository is a trait with a `PostgreSQL` adapter; in-memory
//! adapters are available for tests behind the `test-support` feature.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p marketplace-cli -- migrate
//! ```

pub mod carts;
pub mod catalog;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::{CartRepository, PgCartRepository};
pub use catalog::{CatalogStore, PgCatalogStore};
pub use users::{PgUserDirectory, UserDirectory};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a quantity out of range).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// `PostgreSQL` error code for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// `PostgreSQL` error code for `check_violation`.
const CHECK_VIOLATION: &str = "23514";

impl RepositoryError {
    /// Map a sqlx error, turning range and check violations into
    /// [`RepositoryError::Conflict`] with `message`.
    fn from_constraint(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && matches!(
                db_err.code().as_deref(),
                Some(NUMERIC_OUT_OF_RANGE | CHECK_VIOLATION)
            )
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
