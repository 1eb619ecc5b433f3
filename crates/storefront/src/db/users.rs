//! Customer repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mybookstore_core::{CustomerId, Email, Role};

use super::RepositoryError;
use crate::models::user::{Customer, ProfileUpdate};

/// Columns selected whenever a full `Customer` is materialized.
const CUSTOMER_COLUMNS: &str = "id, email, role, first_name, last_name, phone, \
                                address, city, postal_code, created_at";

/// A customer together with their reset-token expiry, for the reset flow.
#[derive(Debug)]
pub struct ResetCandidate {
    pub customer: Customer,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Repository for customer accounts.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Get a customer by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Create a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        role: Role,
        profile: &ProfileUpdate,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as(&format!(
            "INSERT INTO customer \
               (email, password_hash, role, first_name, last_name, phone, address, city, postal_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.phone.as_deref())
        .bind(profile.address.as_deref())
        .bind(profile.city.as_deref())
        .bind(profile.postal_code.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;
        Ok(row)
    }

    /// Get a customer's password hash by email.
    ///
    /// Returns `None` if no account matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM customer WHERE email = $1")
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;

        let Some((hash,)) = row else {
            return Ok(None);
        };
        let Some(customer) = self.get_by_email(email).await? else {
            return Ok(None);
        };
        Ok(Some((customer, hash)))
    }

    /// Get a customer's password hash by id, for the change-password flow.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    pub async fn password_hash(&self, id: CustomerId) -> Result<String, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM customer WHERE id = $1")
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;
        row.map(|(hash,)| hash).ok_or(RepositoryError::NotFound)
    }

    /// Replace a customer's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    pub async fn update_password(
        &self,
        id: CustomerId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE customer SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Update a customer's contact and address fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        profile: &ProfileUpdate,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer \
             SET first_name = $1, last_name = $2, phone = $3, address = $4, city = $5, postal_code = $6 \
             WHERE id = $7",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.phone.as_deref())
        .bind(profile.address.as_deref())
        .bind(profile.city.as_deref())
        .bind(profile.postal_code.as_deref())
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store a password-reset token and its expiry for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer doesn't exist.
    pub async fn set_reset_token(
        &self,
        id: CustomerId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer SET reset_token = $1, reset_token_expires_at = $2 WHERE id = $3",
        )
        .bind(token)
        .bind(expires_at)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Find the customer holding a reset token, along with its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<ResetCandidate>, RepositoryError> {
        let row: Option<(i32, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT id, reset_token_expires_at FROM customer WHERE reset_token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        let Some((id, expires_at)) = row else {
            return Ok(None);
        };
        let customer = self
            .get_by_id(CustomerId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(Some(ResetCandidate {
            customer,
            expires_at,
        }))
    }

    /// Invalidate a customer's reset token after use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_reset_token(&self, id: CustomerId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE customer SET reset_token = NULL, reset_token_expires_at = NULL WHERE id = $1",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
