//! Password-reset flow: token issuance and consumption.
//!
//! Requesting a reset always reports success, whether or not the email
//! matched an account, so the endpoint cannot be used to enumerate
//! registered addresses. Mail delivery failures are logged and swallowed
//! for the same reason. Tokens are single-use and expire after one hour.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use thiserror::Error;

use mybookstore_core::Email;

use crate::db::RepositoryError;
use crate::db::users::CustomerRepository;
use crate::services::auth::{self, AuthError};
use crate::services::email::EmailService;

/// How long a reset token stays valid.
pub const TOKEN_TTL_HOURS: i64 = 1;

/// Length of the reset token in bytes (hex-encoded to 64 characters).
const TOKEN_BYTES: usize = 32;

/// Errors from consuming a reset token.
#[derive(Debug, Error)]
pub enum ResetError {
    /// Unknown, already-used or expired token.
    #[error("this reset link is invalid or has expired")]
    InvalidToken,

    /// New password failed validation.
    #[error("{0}")]
    WeakPassword(String),

    /// New password and confirmation did not match.
    #[error("the passwords do not match")]
    PasswordMismatch,

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Generate a fresh reset token: 32 random bytes, hex-encoded.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether a token with the given expiry is still usable at `now`.
#[must_use]
fn token_still_valid(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|expiry| now < expiry)
}

/// Password-reset service.
pub struct PasswordResetService<'a> {
    customers: CustomerRepository<'a>,
    mailer: &'a EmailService,
    base_url: &'a str,
}

impl<'a> PasswordResetService<'a> {
    /// Create a new password-reset service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, mailer: &'a EmailService, base_url: &'a str) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
            mailer,
            base_url,
        }
    }

    /// Handle a reset request for `email`.
    ///
    /// Always succeeds from the caller's point of view; whether a token was
    /// issued and mailed is deliberately not observable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` only for infrastructure
    /// failures while storing the token - never for an unknown email.
    #[tracing::instrument(skip(self, email))]
    pub async fn request(&self, email: &str) -> Result<(), RepositoryError> {
        let Ok(email) = Email::parse(email) else {
            // Malformed input gets the same response as an unknown address.
            return Ok(());
        };

        let Some(customer) = self.customers.get_by_email(&email).await? else {
            return Ok(());
        };

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
        self.customers
            .set_reset_token(customer.id, &token, expires_at)
            .await?;

        let reset_url = format!("{}/reset-password/{token}", self.base_url);
        if let Err(e) = self
            .mailer
            .send_password_reset(
                customer.email.as_str(),
                &customer.first_name,
                &reset_url,
                expires_at,
            )
            .await
        {
            tracing::error!(customer_id = %customer.id, "failed to send reset email: {e}");
        }

        Ok(())
    }

    /// Look up a token without consuming it, for rendering the reset form.
    ///
    /// # Errors
    ///
    /// Returns `ResetError::InvalidToken` for unknown or expired tokens.
    pub async fn verify_token(&self, token: &str) -> Result<(), ResetError> {
        let candidate = self
            .customers
            .find_by_reset_token(token)
            .await?
            .ok_or(ResetError::InvalidToken)?;

        if !token_still_valid(candidate.expires_at, Utc::now()) {
            return Err(ResetError::InvalidToken);
        }
        Ok(())
    }

    /// Consume a token and set the new password.
    ///
    /// The token is cleared on success, so a second use fails with
    /// `InvalidToken`.
    ///
    /// # Errors
    ///
    /// Returns `ResetError::InvalidToken` for unknown/expired tokens and
    /// the usual validation errors for the new password.
    #[tracing::instrument(skip_all)]
    pub async fn reset(
        &self,
        token: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> Result<(), ResetError> {
        let candidate = self
            .customers
            .find_by_reset_token(token)
            .await?
            .ok_or(ResetError::InvalidToken)?;

        if !token_still_valid(candidate.expires_at, Utc::now()) {
            return Err(ResetError::InvalidToken);
        }

        auth::validate_password(new_password, new_password_confirm).map_err(|e| match e {
            AuthError::WeakPassword(msg) => ResetError::WeakPassword(msg),
            _ => ResetError::PasswordMismatch,
        })?;

        let hash = auth::hash_password(new_password).map_err(|_| {
            ResetError::Repository(RepositoryError::DataCorruption(
                "password hashing failed".to_owned(),
            ))
        })?;

        let id = candidate.customer.id;
        self.customers.update_password(id, &hash).await?;
        self.customers.clear_reset_token(id).await?;

        tracing::info!(customer_id = %id, "password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_token_validity_window() {
        let now = Utc::now();
        assert!(token_still_valid(Some(now + Duration::minutes(5)), now));
        assert!(!token_still_valid(Some(now - Duration::minutes(5)), now));
        assert!(!token_still_valid(Some(now), now));
        // A cleared expiry means the token was already used.
        assert!(!token_still_valid(None, now));
    }
}
