//! Database access for the storefront.
//!
//! Repositories use sqlx's runtime query API (`query`/`query_as` with
//! `FromRow`) so the crate builds without a live database.
//!
//! ## Tables
//!
//! - `book`, `author`, `category`, `publisher` plus the `book_author` and
//!   `book_category` junction tables - the catalogue
//! - `customer` - accounts, credentials and password-reset tokens
//! - `customer_order`, `order_line` - orders written by checkout
//! - `configuration` - key-value settings
//! - `tower_sessions.session` - server-side session storage
//!
//! # Migrations
//!
//! Migrations live in `migrations/` at the workspace root and run via:
//! ```bash
//! cargo run -p mybookstore-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod books;
pub mod orders;
pub mod taxonomies;
pub mod users;

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

    /// A stored value could not be interpreted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
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
