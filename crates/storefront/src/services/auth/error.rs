//! Authentication error types.

use thiserror::Error;

use bookstore_core::{PermissionDenied, UsernameError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// Password was empty.
    #[error("password cannot be empty")]
    EmptyPassword,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Username already taken.
    #[error("username already exists")]
    UserAlreadyExists,

    /// The acting identity may not perform this operation.
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the error was caused by the submitted input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidUsername(_) | Self::EmptyPassword)
    }
}
