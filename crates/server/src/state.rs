//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{ConfigError, ServerConfig};
use crate::db::{PgCartRepository, PgCatalogStore, PgUserDirectory};
use crate::services::{CartManager, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    carts: CartManager,
    tokens: TokenService,
}

impl AppState {
    /// Create application state backed by `PostgreSQL` repositories.
    ///
    /// # Errors
    ///
    /// Returns an error if the bearer token key cannot be decoded.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, ConfigError> {
        let carts = CartManager::new(
            Arc::new(PgCartRepository::new(pool.clone())),
            Arc::new(PgUserDirectory::new(pool.clone())),
            Arc::new(PgCatalogStore::new(pool.clone())),
        );
        let tokens = TokenService::new(&config.jwt)?;
        Ok(Self::from_parts(config, pool, carts, tokens))
    }

    /// Assemble state from already-built services.
    ///
    /// Lets tests swap in in-memory repositories.
    #[must_use]
    pub fn from_parts(
        config: ServerConfig,
        pool: PgPool,
        carts: CartManager,
        tokens: TokenService,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carts,
                tokens,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartManager {
        &self.inner.carts
    }

    /// Get a reference to the bearer token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
