//! Publisher administration queries.

use sqlx::PgPool;

use mybookstore_core::PublisherId;

use super::{RepositoryError, map_delete_error, page_count, page_offset};

/// A publisher row, with the number of books referencing it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PublisherRow {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub book_count: i64,
}

/// Editable publisher fields.
#[derive(Debug, Clone, Default)]
pub struct PublisherInput {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// One page of the publisher list.
#[derive(Debug)]
pub struct PublisherListPage {
    pub rows: Vec<PublisherRow>,
    pub total: u64,
    pub total_pages: u32,
}

/// Repository for publisher administration.
pub struct PublisherAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PublisherAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of publishers, optionally filtered by name substring.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: u32,
        per_page: u32,
    ) -> Result<PublisherListPage, RepositoryError> {
        let pattern = search.filter(|s| !s.is_empty()).map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM publisher WHERE $1::text IS NULL OR name ILIKE $1",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;
        let total = u64::try_from(total).unwrap_or(0);

        let rows = sqlx::query_as(
            "SELECT p.id, p.name, p.address, p.phone, \
                    (SELECT COUNT(*) FROM book b WHERE b.publisher_id = p.id) AS book_count \
             FROM publisher p \
             WHERE $1::text IS NULL OR p.name ILIKE $1 \
             ORDER BY p.name \
             LIMIT $2 OFFSET $3",
        )
        .bind(pattern.as_deref())
        .bind(i64::from(per_page))
        .bind(page_offset(page, per_page))
        .fetch_all(self.pool)
        .await?;

        Ok(PublisherListPage {
            rows,
            total,
            total_pages: page_count(total, per_page),
        })
    }

    /// All publishers, for the book form's select.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<PublisherRow>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT p.id, p.name, p.address, p.phone, \
                    (SELECT COUNT(*) FROM book b WHERE b.publisher_id = p.id) AS book_count \
             FROM publisher p ORDER BY p.name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Load one publisher.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn get(&self, id: PublisherId) -> Result<PublisherRow, RepositoryError> {
        let row: Option<PublisherRow> = sqlx::query_as(
            "SELECT p.id, p.name, p.address, p.phone, \
                    (SELECT COUNT(*) FROM book b WHERE b.publisher_id = p.id) AS book_count \
             FROM publisher p WHERE p.id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound)
    }

    /// Create a publisher.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &PublisherInput) -> Result<PublisherId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO publisher (name, address, phone) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&input.name)
        .bind(input.address.as_deref())
        .bind(input.phone.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(PublisherId::new(id))
    }

    /// Update a publisher.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn update(
        &self,
        id: PublisherId,
        input: &PublisherInput,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE publisher SET name = $1, address = $2, phone = $3 WHERE id = $4")
                .bind(&input.name)
                .bind(input.address.as_deref())
                .bind(input.phone.as_deref())
                .bind(id.as_i32())
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a publisher.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InUse` if books still reference it,
    /// `RepositoryError::NotFound` if the id does not exist.
    pub async fn delete(&self, id: PublisherId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM publisher WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error(e, "publisher"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
