//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use marketplace_core::{Email, Role, UserId, Username};

/// A marketplace user account (domain type).
///
/// Owns at most one cart; deleting the user deletes the cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login handle.
    pub username: Username,
    /// Unique email address.
    pub email: Email,
    /// Roles granted to this account.
    pub roles: Vec<Role>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the account holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
