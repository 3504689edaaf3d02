//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use bookstore_core::{Action, Identity, Role, UserId, Username};

use super::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's login name.
    pub username: Username,
    /// Role at login time.
    pub role: Role,
}

impl CurrentUser {
    /// The identity the policy sees for this session.
    #[must_use]
    pub const fn identity(&self) -> Identity {
        Identity::user(self.id, self.role)
    }

    /// Shorthand for a policy check against this session's identity.
    #[must_use]
    pub const fn can(&self, action: Action) -> bool {
        self.identity().can(action)
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for queued one-shot flash messages.
    pub const FLASH: &str = "flash";
}
