//! Author administration queries.

use sqlx::PgPool;

use mybookstore_core::AuthorId;

use super::{RepositoryError, map_delete_error, page_count, page_offset};

/// An author row, with the number of books referencing it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorRow {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub biography: Option<String>,
    pub book_count: i64,
}

/// Editable author fields.
#[derive(Debug, Clone, Default)]
pub struct AuthorInput {
    pub first_name: String,
    pub last_name: String,
    pub biography: Option<String>,
}

/// One page of the author list.
#[derive(Debug)]
pub struct AuthorListPage {
    pub rows: Vec<AuthorRow>,
    pub total: u64,
    pub total_pages: u32,
}

/// Repository for author administration.
pub struct AuthorAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthorAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of authors, optionally filtered by name substring.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> Result<AuthorListPage, RepositoryError> {
        let pattern = search
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM author \
             WHERE $1::text IS NULL OR first_name || ' ' || last_name ILIKE $1",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;
        let total = u64::try_from(total).unwrap_or(0);

        let rows = sqlx::query_as(
            "SELECT a.id, a.first_name, a.last_name, a.biography, \
                    (SELECT COUNT(*) FROM book_author ba WHERE ba.author_id = a.id) AS book_count \
             FROM author a \
             WHERE $1::text IS NULL OR a.first_name || ' ' || a.last_name ILIKE $1 \
             ORDER BY a.last_name, a.first_name \
             LIMIT $2 OFFSET $3",
        )
        .bind(pattern.as_deref())
        .bind(i64::from(per_page))
        .bind(page_offset(page, per_page))
        .fetch_all(self.pool)
        .await?;

        Ok(AuthorListPage {
            rows,
            total,
            total_pages: page_count(total, per_page),
        })
    }

    /// All authors, for the book form's multi-select.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<AuthorRow>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT a.id, a.first_name, a.last_name, a.biography, \
                    (SELECT COUNT(*) FROM book_author ba WHERE ba.author_id = a.id) AS book_count \
             FROM author a ORDER BY a.last_name, a.first_name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Load one author.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn get(&self, id: AuthorId) -> Result<AuthorRow, RepositoryError> {
        let row: Option<AuthorRow> = sqlx::query_as(
            "SELECT a.id, a.first_name, a.last_name, a.biography, \
                    (SELECT COUNT(*) FROM book_author ba WHERE ba.author_id = a.id) AS book_count \
             FROM author a WHERE a.id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound)
    }

    /// Create an author.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &AuthorInput) -> Result<AuthorId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO author (first_name, last_name, biography) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.biography.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(AuthorId::new(id))
    }

    /// Update an author.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn update(&self, id: AuthorId, input: &AuthorInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE author SET first_name = $1, last_name = $2, biography = $3 WHERE id = $4",
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.biography.as_deref())
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an author. Junction rows are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn delete(&self, id: AuthorId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM author WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error(e, "author"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
