//! Category administration queries.

use sqlx::PgPool;

use mybookstore_core::CategoryId;

use super::{RepositoryError, map_delete_error, page_count, page_offset};

/// A category row, with the number of books referencing it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub book_count: i64,
}

/// Editable category fields.
#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

/// One page of the category list.
#[derive(Debug)]
pub struct CategoryListPage {
    pub rows: Vec<CategoryRow>,
    pub total: u64,
    pub total_pages: u32,
}

/// Repository for category administration.
pub struct CategoryAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of categories, optionally filtered by name substring.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> Result<CategoryListPage, RepositoryError> {
        let pattern = search.filter(|s| !s.is_empty()).map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM category WHERE $1::text IS NULL OR name ILIKE $1",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;
        let total = u64::try_from(total).unwrap_or(0);

        let rows = sqlx::query_as(
            "SELECT c.id, c.name, c.description, \
                    (SELECT COUNT(*) FROM book_category bc WHERE bc.category_id = c.id) AS book_count \
             FROM category c \
             WHERE $1::text IS NULL OR c.name ILIKE $1 \
             ORDER BY c.name \
             LIMIT $2 OFFSET $3",
        )
        .bind(pattern.as_deref())
        .bind(i64::from(per_page))
        .bind(page_offset(page, per_page))
        .fetch_all(self.pool)
        .await?;

        Ok(CategoryListPage {
            rows,
            total,
            total_pages: page_count(total, per_page),
        })
    }

    /// All categories, for the book form's multi-select.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<CategoryRow>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT c.id, c.name, c.description, \
                    (SELECT COUNT(*) FROM book_category bc WHERE bc.category_id = c.id) AS book_count \
             FROM category c ORDER BY c.name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Load one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn get(&self, id: CategoryId) -> Result<CategoryRow, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "SELECT c.id, c.name, c.description, \
                    (SELECT COUNT(*) FROM book_category bc WHERE bc.category_id = c.id) AS book_count \
             FROM category c WHERE c.id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &CategoryInput) -> Result<CategoryId, RepositoryError> {
        let (id,): (i32,) =
            sqlx::query_as("INSERT INTO category (name, description) VALUES ($1, $2) RETURNING id")
                .bind(&input.name)
                .bind(input.description.as_deref())
                .fetch_one(self.pool)
                .await?;
        Ok(CategoryId::new(id))
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn update(&self, id: CategoryId, input: &CategoryInput) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE category SET name = $1, description = $2 WHERE id = $3")
            .bind(&input.name)
            .bind(input.description.as_deref())
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a category. Junction rows are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error(e, "category"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
