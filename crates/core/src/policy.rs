//! Authorization policy.
//!
//! A stateless decision table mapping `(role, action)` to allow/deny. Every
//! mutating service call asks [`Identity::authorize`] before touching storage.
//!
//! | Role      | `ManageBooks` | `CreateAdmin` | `ViewCatalog` | `UseCart` | `UploadFiles` |
//! |-----------|---------------|---------------|---------------|-----------|---------------|
//! | anonymous | deny          | deny          | allow         | deny      | deny          |
//! | user      | deny          | deny          | allow         | allow     | deny          |
//! | admin     | allow         | deny          | allow         | allow     | allow         |
//! | owner     | allow         | allow         | allow         | allow     | allow         |

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// Something a caller may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Browse, search and read books.
    ViewCatalog,
    /// View and modify one's own cart.
    UseCart,
    /// Add or delete books.
    ManageBooks,
    /// Create admin accounts.
    CreateAdmin,
    /// Upload files to the shared storage directory.
    UploadFiles,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ViewCatalog => "view the catalog",
            Self::UseCart => "use a cart",
            Self::ManageBooks => "manage books",
            Self::CreateAdmin => "create admin accounts",
            Self::UploadFiles => "upload files",
        };
        f.write_str(name)
    }
}

/// Returned when the policy denies an action.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("permission denied: cannot {action}")]
pub struct PermissionDenied {
    /// The action that was refused.
    pub action: Action,
}

/// Decide whether a caller with `role` (`None` for anonymous) may perform `action`.
#[must_use]
pub const fn is_allowed(role: Option<Role>, action: Action) -> bool {
    match (role, action) {
        (_, Action::ViewCatalog) => true,
        (None, _) => false,
        (Some(_), Action::UseCart) => true,
        (Some(role), Action::ManageBooks | Action::UploadFiles) => role.is_staff(),
        (Some(role), Action::CreateAdmin) => matches!(role, Role::Owner),
    }
}

/// Who is making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// No session.
    Anonymous,
    /// A logged-in account.
    User {
        /// Account id.
        id: UserId,
        /// Account role at login time.
        role: Role,
    },
}

impl Identity {
    /// Identity of a logged-in account.
    #[must_use]
    pub const fn user(id: UserId, role: Role) -> Self {
        Self::User { id, role }
    }

    /// The role, or `None` when anonymous.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::User { role, .. } => Some(*role),
        }
    }

    /// The account id, or `None` when anonymous.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } => Some(*id),
        }
    }

    /// Whether the policy allows this identity to perform `action`.
    #[must_use]
    pub const fn can(&self, action: Action) -> bool {
        is_allowed(self.role(), action)
    }

    /// Check the policy for `action`.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the policy refuses the action.
    pub const fn authorize(&self, action: Action) -> Result<(), PermissionDenied> {
        if self.can(action) {
            Ok(())
        } else {
            Err(PermissionDenied { action })
        }
    }
}
