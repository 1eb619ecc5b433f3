//! Book administration queries: CRUD plus junction-table synchronization.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use mybookstore_core::BookId;

use super::{RepositoryError, map_delete_error, page_count, page_offset};

/// A book row on the admin list page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookListRow {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub price: Decimal,
    pub stock: i32,
    pub language: String,
    pub publisher_name: String,
}

/// Filters accepted by the book list page.
#[derive(Debug, Clone, Default)]
pub struct BookListParams {
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub publisher_id: Option<i32>,
    pub language: Option<String>,
    pub page: u32,
}

/// Editable book fields, as submitted by the create/edit forms.
///
/// `author_ids` and `category_ids` replace the junction rows wholesale;
/// synchronization of the many-to-many sides happens here, not via object
/// back-references.
#[derive(Debug, Clone)]
pub struct BookInput {
    pub title: String,
    pub isbn: String,
    pub page_count: i32,
    pub publication_date: Option<chrono::NaiveDate>,
    pub price: Decimal,
    pub stock: i32,
    pub copies_printed: i32,
    pub language: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub publisher_id: i32,
    pub author_ids: Vec<i32>,
    pub category_ids: Vec<i32>,
}

/// A book loaded for the edit form.
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: BookId,
    pub input: BookInput,
}

/// One page of the book list.
#[derive(Debug)]
pub struct BookListPage {
    pub rows: Vec<BookListRow>,
    pub total: u64,
    pub total_pages: u32,
}

fn push_list_where(qb: &mut QueryBuilder<'_, Postgres>, params: &BookListParams) {
    qb.push(" WHERE TRUE");
    if let Some(term) = params.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{term}%");
        qb.push(" AND (b.title ILIKE ").push_bind(pattern.clone());
        qb.push(" OR b.isbn ILIKE ").push_bind(pattern);
        qb.push(")");
    }
    if let Some(id) = params.category_id {
        qb.push(" AND EXISTS (SELECT 1 FROM book_category bc WHERE bc.book_id = b.id AND bc.category_id = ")
            .push_bind(id);
        qb.push(")");
    }
    if let Some(id) = params.publisher_id {
        qb.push(" AND b.publisher_id = ").push_bind(id);
    }
    if let Some(language) = params.language.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND b.language = ").push_bind(language.to_owned());
    }
}

/// Repository for book administration.
pub struct BookAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of books matching the filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        params: &BookListParams,
        per_page: u32,
    ) -> Result<BookListPage, RepositoryError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM book b");
        push_list_where(&mut count_qb, params);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;
        let total = u64::try_from(total).unwrap_or(0);

        let mut qb = QueryBuilder::new(
            "SELECT b.id, b.title, b.isbn, b.price, b.stock, b.language, \
             p.name AS publisher_name FROM book b JOIN publisher p ON p.id = b.publisher_id",
        );
        push_list_where(&mut qb, params);
        qb.push(" ORDER BY b.id DESC");
        qb.push(" LIMIT ").push_bind(i64::from(per_page));
        qb.push(" OFFSET ").push_bind(page_offset(params.page, per_page));

        let rows = qb.build_query_as().fetch_all(self.pool).await?;

        Ok(BookListPage {
            rows,
            total,
            total_pages: page_count(total, per_page),
        })
    }

    /// Distinct languages for the list filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn languages(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query_scalar("SELECT DISTINCT language FROM book ORDER BY language")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Load a book for the edit form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn get(&self, id: BookId) -> Result<BookRecord, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            title: String,
            isbn: String,
            page_count: i32,
            publication_date: Option<chrono::NaiveDate>,
            price: Decimal,
            stock: i32,
            copies_printed: i32,
            language: String,
            description: Option<String>,
            cover_image: Option<String>,
            publisher_id: i32,
        }

        let row: Option<Row> = sqlx::query_as(
            "SELECT title, isbn, page_count, publication_date, price, stock, \
                    copies_printed, language, description, cover_image, publisher_id \
             FROM book WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        let row = row.ok_or(RepositoryError::NotFound)?;

        let author_ids: Vec<i32> =
            sqlx::query_scalar("SELECT author_id FROM book_author WHERE book_id = $1 ORDER BY author_id")
                .bind(id.as_i32())
                .fetch_all(self.pool)
                .await?;
        let category_ids: Vec<i32> = sqlx::query_scalar(
            "SELECT category_id FROM book_category WHERE book_id = $1 ORDER BY category_id",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(BookRecord {
            id,
            input: BookInput {
                title: row.title,
                isbn: row.isbn,
                page_count: row.page_count,
                publication_date: row.publication_date,
                price: row.price,
                stock: row.stock,
                copies_printed: row.copies_printed,
                language: row.language,
                description: row.description,
                cover_image: row.cover_image,
                publisher_id: row.publisher_id,
                author_ids,
                category_ids,
            },
        })
    }

    /// Create a book and its junction rows in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create(&self, input: &BookInput) -> Result<BookId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO book (title, isbn, page_count, publication_date, price, stock, \
                               copies_printed, language, description, cover_image, publisher_id, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW()) \
             RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.isbn)
        .bind(input.page_count)
        .bind(input.publication_date)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.copies_printed)
        .bind(&input.language)
        .bind(input.description.as_deref())
        .bind(input.cover_image.as_deref())
        .bind(input.publisher_id)
        .fetch_one(&mut *tx)
        .await?;

        sync_junctions(&mut tx, id, &input.author_ids, &input.category_ids).await?;

        tx.commit().await?;
        Ok(BookId::new(id))
    }

    /// Update a book, replacing its junction rows, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn update(&self, id: BookId, input: &BookInput) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE book SET title = $1, isbn = $2, page_count = $3, publication_date = $4, \
                             price = $5, stock = $6, copies_printed = $7, language = $8, \
                             description = $9, cover_image = $10, publisher_id = $11, updated_at = NOW() \
             WHERE id = $12",
        )
        .bind(&input.title)
        .bind(&input.isbn)
        .bind(input.page_count)
        .bind(input.publication_date)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.copies_printed)
        .bind(&input.language)
        .bind(input.description.as_deref())
        .bind(input.cover_image.as_deref())
        .bind(input.publisher_id)
        .bind(id.as_i32())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sync_junctions(&mut tx, id.as_i32(), &input.author_ids, &input.category_ids).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InUse` if order lines reference the book,
    /// `RepositoryError::NotFound` if the id does not exist.
    pub async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM book WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await
            .map_err(|e| map_delete_error(e, "book"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Replace both junction tables for a book (delete-then-insert).
async fn sync_junctions(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    book_id: i32,
    author_ids: &[i32],
    category_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM book_author WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut **tx)
        .await?;
    for author_id in author_ids {
        sqlx::query("INSERT INTO book_author (book_id, author_id) VALUES ($1, $2)")
            .bind(book_id)
            .bind(author_id)
            .execute(&mut **tx)
            .await?;
    }

    sqlx::query("DELETE FROM book_category WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut **tx)
        .await?;
    for category_id in category_ids {
        sqlx::query("INSERT INTO book_category (book_id, category_id) VALUES ($1, $2)")
            .bind(book_id)
            .bind(category_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_where_combines_filters() {
        let params = BookListParams {
            search: Some("dune".to_string()),
            category_id: Some(3),
            publisher_id: Some(1),
            language: Some("French".to_string()),
            page: 1,
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM book b");
        push_list_where(&mut qb, &params);
        let sql = qb.sql();
        assert!(sql.contains("b.title ILIKE $1"));
        assert!(sql.contains("bc.category_id = $3"));
        assert!(sql.contains("b.publisher_id = $4"));
        assert!(sql.contains("b.language = $5"));
    }

    #[test]
    fn test_list_where_skips_blank_search() {
        let params = BookListParams {
            search: Some(String::new()),
            ..BookListParams::default()
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM book b");
        push_list_where(&mut qb, &params);
        assert!(!qb.sql().contains("ILIKE"));
    }
}
