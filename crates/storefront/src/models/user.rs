//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use bookstore_core::{Identity, Role, UserId, Username};

/// A store account (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Account role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The identity this account acts as.
    #[must_use]
    pub const fn identity(&self) -> Identity {
        Identity::user(self.id, self.role)
    }
}
