//! Bearer token service.
//!
//! Tokens are HS256 JWTs whose subject is the username. They carry no
//! roles; roles are always read from the user directory.

mod error;

pub use error::AuthError;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use marketplace_core::Username;

use crate::config::{ConfigError, JwtConfig};
use crate::models::Identity;

/// Claims carried in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// Issued at (seconds since the epoch).
    pub iat: i64,
    /// Expiration (seconds since the epoch).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    expiration_secs: i64,
}

impl TokenService {
    /// Build a token service from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the signing key is not valid
    /// base64.
    pub fn new(config: &JwtConfig) -> Result<Self, ConfigError> {
        let key = config.key_bytes()?;
        Ok(Self::from_key(
            &key,
            config.issuer.clone(),
            i64::try_from(config.expiration_secs).unwrap_or(i64::MAX),
        ))
    }

    /// Build a token service from raw key bytes.
    #[must_use]
    pub fn from_key(key: &[u8], issuer: String, expiration_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            issuer,
            expiration_secs,
        }
    }

    /// Issue a token for `username`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if encoding fails.
    pub fn issue(&self, username: &Username) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.as_str().to_owned(),
            iat: now,
            exp: now.saturating_add(self.expiration_secs),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)
    }

    /// Verify a token and return the identity it names.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the signature, expiry, algorithm
    /// or issuer check fails, and `AuthError::InvalidSubject` if the subject
    /// is not a valid username.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(AuthError::InvalidToken)?;

        Ok(Identity::new(Username::parse(&data.claims.sub)?))
    }
}
