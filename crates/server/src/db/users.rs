//! User directory.
//!
//! Accounts are registered elsewhere; the cart flow only resolves an
//! authenticated username to its stored account and roles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marketplace_core::{Email, Role, UserId, Username};

use super::RepositoryError;
use crate::models::User;

/// Read access to user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up an account by its exact username.
    async fn find_by_username(&self, username: &Username)
    -> Result<Option<User>, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}

/// `PostgreSQL` implementation of [`UserDirectory`].
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user directory.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, created_at
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let role_names: Vec<String> = sqlx::query_scalar(
            r"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            ORDER BY role
            ",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let roles = role_names
            .iter()
            .map(|name| name.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
            })?;

        Ok(Some(User {
            id: UserId::new(row.id),
            username,
            email,
            roles,
            created_at: row.created_at,
        }))
    }
}
