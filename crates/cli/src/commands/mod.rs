//! CLI command implementations.

pub mod cart;
pub mod migrate;
pub mod token;

use secrecy::SecretString;

/// Database URL from `MARKETPLACE_DATABASE_URL`, falling back to
/// `DATABASE_URL`. Loads `.env` first.
pub fn database_url() -> Option<SecretString> {
    let _ = dotenvy::dotenv();
    std::env::var("MARKETPLACE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
