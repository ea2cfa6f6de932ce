//! Cart maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! # Print a user's cart as JSON
//! mp-cli cart show --username alice
//!
//! # Delete a user's cart and all of its line items
//! mp-cli cart purge --username alice
//! ```
//!
//! # Environment Variables
//!
//! - `MARKETPLACE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use std::sync::Arc;

use thiserror::Error;

use marketplace_core::{Username, UsernameError};
use marketplace_server::db::{self, PgCartRepository, PgCatalogStore, PgUserDirectory};
use marketplace_server::models::Identity;
use marketplace_server::services::{CartError, CartManager};

/// Errors that can occur during cart maintenance.
#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

async fn connect() -> Result<CartManager, CartCommandError> {
    let database_url = super::database_url()
        .ok_or(CartCommandError::MissingEnvVar("MARKETPLACE_DATABASE_URL"))?;
    let pool = db::create_pool(&database_url).await?;

    Ok(CartManager::new(
        Arc::new(PgCartRepository::new(pool.clone())),
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgCatalogStore::new(pool)),
    ))
}

/// Print the user's cart, with products and totals, as JSON.
///
/// # Errors
///
/// Returns `CartCommandError` if the user does not exist or the database
/// fails.
pub async fn show(username: &str) -> Result<(), CartCommandError> {
    let identity = Identity::new(Username::parse(username)?);
    let view = connect().await?.get_cart(&identity).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }
    Ok(())
}

/// Delete the user's cart and all of its line items.
///
/// # Errors
///
/// Returns `CartCommandError` if the user does not exist or the database
/// fails.
pub async fn purge(username: &str) -> Result<(), CartCommandError> {
    let identity = Identity::new(Username::parse(username)?);

    if connect().await?.delete_cart_for_user(&identity).await? {
        tracing::info!(%username, "Cart deleted");
    } else {
        tracing::info!(%username, "User has no cart");
    }
    Ok(())
}
