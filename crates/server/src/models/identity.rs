//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

use marketplace_core::Username;

/// The identity of an authenticated caller, taken from a verified bearer
/// token subject.
///
/// Cart operations receive it as an explicit argument. It is resolved to a
/// stored [`User`](super::User) through the user directory on every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Username carried as the token subject.
    pub username: Username,
}

impl Identity {
    /// Create an identity for a username.
    #[must_use]
    pub const fn new(username: Username) -> Self {
        Self { username }
    }
}
