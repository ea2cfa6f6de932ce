//! Cart service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Product, or line item for the product, does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Quantity out of the accepted range.
    #[error("{0}")]
    InvalidArgument(String),

    /// Server-side fault, such as an authenticated caller with no stored
    /// account.
    #[error("internal error: {0}")]
    Internal(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CartError {
    /// Map a repository error, treating a rejected quantity as bad input.
    pub(super) fn from_repository(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(message) => Self::InvalidArgument(message),
            other => Self::Repository(other),
        }
    }
}
