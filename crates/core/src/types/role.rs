//! Account roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for an unknown role name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleError(pub String);

/// Role granted to a user account.
///
/// Stored and serialized with the `ROLE_` prefix (`ROLE_USER`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Buyer account. Every registered user has it.
    #[serde(rename = "ROLE_USER")]
    User,
    /// Account that operates stores and lists products.
    #[serde(rename = "ROLE_SELLER")]
    Seller,
    /// Platform administrator.
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    /// The stored name of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Seller => "ROLE_SELLER",
            Self::Admin => "ROLE_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    /// Accepts both the stored form (`ROLE_SELLER`) and the short form
    /// used in signup payloads (`seller`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(&upper) {
            "USER" => Ok(Self::User),
            "SELLER" => Ok(Self::Seller),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(RoleError(s.to_owned())),
        }
    }
}
