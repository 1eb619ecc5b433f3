//! Database access for the admin panel.
//!
//! Repositories use sqlx's runtime query API (`query`/`query_as` with
//! `FromRow`) so the crate builds without a live database. The admin panel
//! shares the storefront's schema; its queries are CRUD-shaped rather than
//! catalogue-shaped.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod authors;
pub mod books;
pub mod categories;
pub mod orders;
pub mod publishers;
pub mod settings;
pub mod stats;
pub mod users;

/// Rows shown per admin list page.
pub const ADMIN_PAGE_SIZE: u32 = 20;

/// Errors from the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row is referenced by other data and cannot be deleted.
    #[error("in use: {0}")]
    InUse(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a foreign-key violation to `InUse`, everything else to `Database`.
pub(crate) fn map_delete_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::InUse(format!("{what} is referenced by existing records"));
    }
    RepositoryError::Database(e)
}

/// Compute LIMIT/OFFSET for a 1-based page.
#[must_use]
pub(crate) fn page_offset(page: u32, per_page: u32) -> i64 {
    i64::from(page.max(1) - 1) * i64::from(per_page)
}

/// Number of pages needed for `total` rows.
#[must_use]
pub(crate) fn page_count(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(2, 20), 20);
        // page 0 is treated as page 1
        assert_eq!(page_offset(0, 20), 0);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
    }
}
