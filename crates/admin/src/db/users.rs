//! User administration queries.
//!
//! The back office manages the same `customer` table the storefront
//! authenticates against; this repository exposes the admin-shaped CRUD
//! over it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mybookstore_core::{CustomerId, Role};

use super::{RepositoryError, map_delete_error, page_count, page_offset};

/// A user row on the admin list page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub order_count: i64,
}

/// Editable user fields (password handled separately).
#[derive(Debug, Clone)]
pub struct UserInput {
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// One page of the user list.
#[derive(Debug)]
pub struct UserListPage {
    pub rows: Vec<UserRow>,
    pub total: u64,
    pub total_pages: u32,
}

const USER_SELECT: &str = "SELECT c.id, c.email, c.role, c.first_name, c.last_name, c.phone, \
                                  c.address, c.city, c.postal_code, c.created_at, \
                                  (SELECT COUNT(*) FROM customer_order o WHERE o.customer_id = c.id) AS order_count \
                           FROM customer c";

/// Repository for user administration.
pub struct UserAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of users, newest first, optionally filtered by a substring
    /// of email or name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> Result<UserListPage, RepositoryError> {
        let pattern = search.filter(|s| !s.is_empty()).map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customer c \
             WHERE $1::text IS NULL \
                OR c.email ILIKE $1 \
                OR c.first_name || ' ' || c.last_name ILIKE $1",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;
        let total = u64::try_from(total).unwrap_or(0);

        let rows = sqlx::query_as(&format!(
            "{USER_SELECT} \
             WHERE $1::text IS NULL \
                OR c.email ILIKE $1 \
                OR c.first_name || ' ' || c.last_name ILIKE $1 \
             ORDER BY c.id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(pattern.as_deref())
        .bind(i64::from(per_page))
        .bind(page_offset(page, per_page))
        .fetch_all(self.pool)
        .await?;

        Ok(UserListPage {
            rows,
            total,
            total_pages: page_count(total, per_page),
        })
    }

    /// Load one user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn get(&self, id: CustomerId) -> Result<UserRow, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{USER_SELECT} WHERE c.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        row.ok_or(RepositoryError::NotFound)
    }

    /// Create a user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        input: &UserInput,
        password_hash: &str,
    ) -> Result<CustomerId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO customer \
               (email, password_hash, role, first_name, last_name, phone, address, city, postal_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(&input.email)
        .bind(password_hash)
        .bind(input.role)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(input.city.as_deref())
        .bind(input.postal_code.as_deref())
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
        Ok(CustomerId::new(id))
    }

    /// Update a user's fields; `new_password_hash` rotates the credential
    /// when provided.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn update(
        &self,
        id: CustomerId,
        input: &UserInput,
        new_password_hash: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customer \
             SET email = $1, role = $2, first_name = $3, last_name = $4, phone = $5, \
                 address = $6, city = $7, postal_code = $8, \
                 password_hash = COALESCE($9, password_hash) \
             WHERE id = $10",
        )
        .bind(&input.email)
        .bind(input.role)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(input.city.as_deref())
        .bind(input.postal_code.as_deref())
        .bind(new_password_hash)
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Replace just the password hash (used by the reset action).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
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

    /// Get a user's password hash by email, for admin login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &str,
    ) -> Result<Option<(UserRow, String)>, RepositoryError> {
        let row: Option<(i32, String)> =
            sqlx::query_as("SELECT id, password_hash FROM customer WHERE email = $1")
                .bind(email)
                .fetch_optional(self.pool)
                .await?;

        let Some((id, hash)) = row else {
            return Ok(None);
        };
        let user = self.get(CustomerId::new(id)).await?;
        Ok(Some((user, hash)))
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InUse` if orders reference the user,
    /// `RepositoryError::NotFound` if the id does not exist.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error(e, "user"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
