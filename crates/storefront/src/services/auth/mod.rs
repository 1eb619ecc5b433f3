//! Authentication service.
//!
//! Registration, form login and password changes, all backed by Argon2id
//! password hashing.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use mybookstore_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::CustomerRepository;
use crate::models::user::{Customer, ProfileUpdate};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
pub struct AuthService<'a> {
    customers: CustomerRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
        }
    }

    /// Register a new customer with the default subscriber role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email,
    /// `AuthError::WeakPassword`/`PasswordMismatch` for a bad password,
    /// `AuthError::UserAlreadyExists` for a duplicate email.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        password_confirm: &str,
        profile: &ProfileUpdate,
    ) -> Result<Customer, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password, password_confirm)?;

        let password_hash = hash_password(password)?;

        let customer = self
            .customers
            .create(&email, &password_hash, Role::Subscriber, profile)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(customer)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` whether the account is
    /// missing or the password is wrong - the two cases are not
    /// distinguishable from the outside.
    pub async fn login(&self, email: &str, password: &str) -> Result<Customer, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (customer, password_hash) = self
            .customers
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(customer)
    }

    /// Change the password of a logged-in customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongCurrentPassword` if the current password
    /// does not verify, and the usual validation errors for the new one.
    pub async fn change_password(
        &self,
        customer: &Customer,
        current_password: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> Result<(), AuthError> {
        let stored_hash = self.customers.password_hash(customer.id).await?;
        verify_password(current_password, &stored_hash)
            .map_err(|_| AuthError::WrongCurrentPassword)?;

        validate_password(new_password, new_password_confirm)?;

        let new_hash = hash_password(new_password)?;
        self.customers.update_password(customer.id, &new_hash).await?;

        Ok(())
    }
}

/// Validate a password and its confirmation.
pub(crate) fn validate_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "the password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if password != confirmation {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short", "short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("longenough", "longenough").is_ok());
    }

    #[test]
    fn test_validate_password_confirmation() {
        assert!(matches!(
            validate_password("longenough", "different!"),
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse").expect("hash");
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").expect("hash");
        let b = hash_password("same password").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_rejected() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
