//! Authentication error types.

use thiserror::Error;

use mybookstore_core::EmailError;

use crate::db::RepositoryError;

/// Errors from the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password combination did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with an email that already has an account.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Password failed validation.
    #[error("{0}")]
    WeakPassword(String),

    /// Password and confirmation did not match.
    #[error("the passwords do not match")]
    PasswordMismatch,

    /// The current password check failed during a password change.
    #[error("the current password is incorrect")]
    WrongCurrentPassword,

    /// Malformed email address.
    #[error("invalid email address")]
    InvalidEmail(#[from] EmailError),

    /// Hashing failed (should not happen with valid parameters).
    #[error("password hashing failed")]
    PasswordHash,

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// Whether this error is safe to show verbatim to the user.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::PasswordHash | Self::Repository(_))
    }
}
