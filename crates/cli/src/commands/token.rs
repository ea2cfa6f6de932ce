//! Bearer token commands.
//!
//! # Usage
//!
//! ```bash
//! mp-cli token issue --username alice
//! ```
//!
//! # Environment Variables
//!
//! - `MARKETPLACE_JWT_SECRET` - Base64-encoded signing key (same as the server)
//! - `MARKETPLACE_JWT_ISSUER` - Issuer (default: marketplace)
//! - `MARKETPLACE_JWT_EXPIRATION_SECS` - Token lifetime (default: 86400)

use thiserror::Error;

use marketplace_core::{Username, UsernameError};
use marketplace_server::config::{ConfigError, JwtConfig};
use marketplace_server::services::{AuthError, TokenService};

/// Errors that can occur while issuing a token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Token error: {0}")]
    Auth(#[from] AuthError),
}

/// Issue a token for `username` and print it to stdout.
///
/// The account is not looked up: the server resolves it on every request.
///
/// # Errors
///
/// Returns `TokenError` if the signing key is missing or invalid, or the
/// username is malformed.
pub fn issue(username: &str) -> Result<(), TokenError> {
    let _ = dotenvy::dotenv();
    let username = Username::parse(username)?;
    let config = JwtConfig::from_env()?;
    let token = TokenService::new(&config)?.issue(&username)?;

    tracing::info!(%username, expires_in = config.expiration_secs, "Issued token");

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
