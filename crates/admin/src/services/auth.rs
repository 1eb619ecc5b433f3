//! Admin authentication and credential management.
//!
//! Login is gated to the agent role and above; subscribers get the same
//! "invalid credentials" answer as unknown emails. Temporary passwords for
//! back-office accounts are generated here and shown exactly once.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;

use mybookstore_core::Role;

use crate::db::RepositoryError;
use crate::db::users::{UserAdminRepository, UserRow};

/// Length of generated temporary passwords.
const TEMP_PASSWORD_LENGTH: usize = 12;

/// Alphabet for temporary passwords. No look-alike characters (0/O, 1/l/I)
/// since the password is read off the screen and typed once.
const TEMP_PASSWORD_ALPHABET: &[u8] =
    b"abcdefghjkmnpqrstuvwxyzABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Errors from the admin authentication service.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Unknown email, wrong password, or a role below agent.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Hashing failed (should not happen with valid parameters).
    #[error("password hashing failed")]
    PasswordHash,

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserAdminRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserAdminRepository::new(pool),
        }
    }

    /// Login with email and password, requiring at least the agent role.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for unknown emails,
    /// wrong passwords and subscriber accounts alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserRow, AdminAuthError> {
        let (user, hash) = self
            .users
            .get_with_password_hash(email.trim().to_lowercase().as_str())
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;

        // Subscribers are indistinguishable from unknown accounts.
        if !user.role.allows(Role::Agent) {
            return Err(AdminAuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

/// Generate a temporary password for a back-office account.
#[must_use]
pub fn generate_temporary_password() -> String {
    let mut rng = rand::rng();
    (0..TEMP_PASSWORD_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..TEMP_PASSWORD_ALPHABET.len());
            TEMP_PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_password_shape() {
        let password = generate_temporary_password();
        assert_eq!(password.len(), TEMP_PASSWORD_LENGTH);
        assert!(
            password
                .bytes()
                .all(|b| TEMP_PASSWORD_ALPHABET.contains(&b))
        );
    }

    #[test]
    fn test_temporary_passwords_differ() {
        assert_ne!(generate_temporary_password(), generate_temporary_password());
    }

    #[test]
    fn test_alphabet_has_no_lookalikes() {
        for forbidden in [b'0', b'O', b'1', b'l', b'I'] {
            assert!(!TEMP_PASSWORD_ALPHABET.contains(&forbidden));
        }
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = hash_password("agent secret").expect("hash");
        assert!(verify_password("agent secret", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }
}
