//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while issuing or verifying bearer tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// Token is malformed, wrongly signed, expired, or from another issuer.
    #[error("invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    /// Token subject is not a valid username.
    #[error("invalid token subject")]
    InvalidSubject(#[from] marketplace_core::UsernameError),

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}
