//! Lookup queries for the catalogue sidebar: categories and publishers.

use sqlx::PgPool;

use mybookstore_core::{CategoryId, PublisherId};

use super::RepositoryError;
use crate::models::book::{Category, Publisher};

/// Repository for category and publisher lookups.
pub struct TaxonomyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaxonomyRepository<'a> {
    /// Create a new taxonomy repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as("SELECT id, name FROM category ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// All publishers, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn publishers(&self) -> Result<Vec<Publisher>, RepositoryError> {
        let rows = sqlx::query_as("SELECT id, name FROM publisher ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// One category by id, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as("SELECT id, name FROM category WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// One publisher by id, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn publisher(&self, id: PublisherId) -> Result<Option<Publisher>, RepositoryError> {
        let row = sqlx::query_as("SELECT id, name FROM publisher WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }
}
