//! Book repository: catalogue queries with filtering, sorting and pagination.
//!
//! The catalogue query runs in two phases. Joining the many-to-many author
//! and category tables duplicates book rows, so phase one resolves the
//! distinct set of matching ids (grouped by book id, ordered, paged) and
//! phase two fetches full records with relations for just that page.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use mybookstore_core::{BookId, CategoryId, PublisherId};

use super::RepositoryError;
use crate::models::book::{Author, Book, Category, Page, Publisher};

/// Page size used by the public catalogue.
pub const CATALOGUE_PAGE_SIZE: u32 = 12;

/// Optional conjunctive filters over the catalogue.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub category_id: Option<CategoryId>,
    pub publisher_id: Option<PublisherId>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
}

/// Catalogue sort keys.
///
/// Every ordering carries an explicit `id` tie-break so that paging is
/// deterministic even when prices or titles collide. "Newest" uses
/// descending id as an insertion-order proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Title,
}

impl SortKey {
    /// Parse the `sort` query parameter; unknown values fall back to newest.
    #[must_use]
    pub fn from_param(s: &str) -> Self {
        match s {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "title" => Self::Title,
            _ => Self::Newest,
        }
    }

    /// The query-parameter value for this key.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Title => "title",
        }
    }

    /// SQL ORDER BY clause body for the id query.
    const fn order_clause(self) -> &'static str {
        match self {
            Self::Newest => "b.id DESC",
            Self::PriceAsc => "b.price ASC, b.id ASC",
            Self::PriceDesc => "b.price DESC, b.id ASC",
            Self::Title => "b.title ASC, b.id ASC",
        }
    }
}

/// Push the shared FROM/JOIN/WHERE clauses for a catalogue query.
///
/// Only books with stock > 0 are eligible. Filters are conjunctive; the
/// search term matches title, ISBN or author full name as a
/// case-insensitive substring.
fn push_filtered_from(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    qb.push(" FROM book b");
    if filter.category_id.is_some() {
        qb.push(" LEFT JOIN book_category bc ON bc.book_id = b.id");
    }
    if filter.search.is_some() {
        qb.push(" LEFT JOIN book_author ba ON ba.book_id = b.id");
        qb.push(" LEFT JOIN author a ON a.id = ba.author_id");
    }
    qb.push(" WHERE b.stock > 0");
    if let Some(id) = filter.category_id {
        qb.push(" AND bc.category_id = ").push_bind(id.as_i32());
    }
    if let Some(id) = filter.publisher_id {
        qb.push(" AND b.publisher_id = ").push_bind(id.as_i32());
    }
    if let Some(min) = filter.price_min {
        qb.push(" AND b.price >= ").push_bind(min);
    }
    if let Some(max) = filter.price_max {
        qb.push(" AND b.price <= ").push_bind(max);
    }
    if let Some(term) = &filter.search {
        let pattern = format!("%{term}%");
        qb.push(" AND (b.title ILIKE ").push_bind(pattern.clone());
        qb.push(" OR b.isbn ILIKE ").push_bind(pattern.clone());
        qb.push(" OR a.first_name || ' ' || a.last_name ILIKE ")
            .push_bind(pattern);
        qb.push(")");
    }
}

/// Flat book row before relations are attached.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i32,
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
    publisher_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct BookAuthorRow {
    book_id: i32,
    id: i32,
    first_name: String,
    last_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct BookCategoryRow {
    book_id: i32,
    id: i32,
    name: String,
}

/// Repository for catalogue reads.
pub struct BookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find in-stock books matching `filter`, sorted and paginated.
    ///
    /// `page` is 1-based; out-of-range pages return an empty item list with
    /// correct totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn find_with_filters(
        &self,
        filter: &BookFilter,
        sort: SortKey,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Book>, RepositoryError> {
        let page = page.max(1);

        // Phase one: count and resolve the page's distinct ids.
        let mut count_qb = QueryBuilder::new("SELECT COUNT(DISTINCT b.id)");
        push_filtered_from(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;
        let total = u64::try_from(total).unwrap_or(0);

        if total == 0 {
            return Ok(Page::empty(page, per_page));
        }

        let offset = i64::from(page - 1) * i64::from(per_page);
        let mut ids_qb = QueryBuilder::new("SELECT b.id");
        push_filtered_from(&mut ids_qb, filter);
        ids_qb.push(" GROUP BY b.id ORDER BY ");
        ids_qb.push(sort.order_clause());
        ids_qb.push(" LIMIT ").push_bind(i64::from(per_page));
        ids_qb.push(" OFFSET ").push_bind(offset);

        let ids: Vec<i32> = ids_qb.build_query_scalar().fetch_all(self.pool).await?;

        let items = self.fetch_by_ids(&ids).await?;

        Ok(Page {
            items,
            total,
            total_pages: Page::<Book>::page_count(total, per_page),
            current_page: page,
            per_page,
        })
    }

    /// Fetch one book with its relations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn find_by_id(&self, id: BookId) -> Result<Book, RepositoryError> {
        let books = self.fetch_by_ids(&[id.as_i32()]).await?;
        books.into_iter().next().ok_or(RepositoryError::NotFound)
    }

    /// The most recently added in-stock books, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_latest(&self, limit: i64) -> Result<Vec<Book>, RepositoryError> {
        let ids: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM book WHERE stock > 0 ORDER BY id DESC LIMIT $1")
                .bind(limit)
                .fetch_all(self.pool)
                .await?;
        self.fetch_by_ids(&ids).await
    }

    /// Featured in-stock books: largest print runs first, then most recent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_featured(&self, limit: i64) -> Result<Vec<Book>, RepositoryError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM book WHERE stock > 0 \
             ORDER BY copies_printed DESC, publication_date DESC NULLS LAST LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        self.fetch_by_ids(&ids).await
    }

    /// In-stock books sharing at least one category with `book`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_similar(&self, book: &Book, limit: i64) -> Result<Vec<Book>, RepositoryError> {
        if book.categories.is_empty() {
            return Ok(Vec::new());
        }
        let category_ids: Vec<i32> = book.categories.iter().map(|c| c.id.as_i32()).collect();

        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT DISTINCT b.id FROM book b \
             JOIN book_category bc ON bc.book_id = b.id \
             WHERE bc.category_id = ANY($1) AND b.id <> $2 AND b.stock > 0 \
             ORDER BY b.id DESC LIMIT $3",
        )
        .bind(&category_ids)
        .bind(book.id.as_i32())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        self.fetch_by_ids(&ids).await
    }

    /// Fetch full books for the given ids, preserving the ids' order.
    ///
    /// Ids that do not exist are skipped; the cart join relies on this to
    /// drop entries whose book has been deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_many(&self, ids: &[i32]) -> Result<Vec<Book>, RepositoryError> {
        self.fetch_by_ids(ids).await
    }

    /// Fetch full books for the given ids, preserving the ids' order.
    async fn fetch_by_ids(&self, ids: &[i32]) -> Result<Vec<Book>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<BookRow> = sqlx::query_as(
            "SELECT b.id, b.title, b.isbn, b.page_count, b.publication_date, b.price, \
                    b.stock, b.copies_printed, b.language, b.description, b.cover_image, \
                    p.id AS publisher_id, p.name AS publisher_name \
             FROM book b \
             JOIN publisher p ON p.id = b.publisher_id \
             WHERE b.id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let author_rows: Vec<BookAuthorRow> = sqlx::query_as(
            "SELECT ba.book_id, a.id, a.first_name, a.last_name \
             FROM book_author ba \
             JOIN author a ON a.id = ba.author_id \
             WHERE ba.book_id = ANY($1) \
             ORDER BY a.last_name, a.first_name",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let category_rows: Vec<BookCategoryRow> = sqlx::query_as(
            "SELECT bc.book_id, c.id, c.name \
             FROM book_category bc \
             JOIN category c ON c.id = bc.category_id \
             WHERE bc.book_id = ANY($1) \
             ORDER BY c.name",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut authors_by_book: HashMap<i32, Vec<Author>> = HashMap::new();
        for row in author_rows {
            authors_by_book.entry(row.book_id).or_default().push(Author {
                id: row.id.into(),
                first_name: row.first_name,
                last_name: row.last_name,
            });
        }

        let mut categories_by_book: HashMap<i32, Vec<Category>> = HashMap::new();
        for row in category_rows {
            categories_by_book
                .entry(row.book_id)
                .or_default()
                .push(Category {
                    id: row.id.into(),
                    name: row.name,
                });
        }

        let mut books_by_id: HashMap<i32, Book> = rows
            .into_iter()
            .map(|row| {
                let authors = authors_by_book.remove(&row.id).unwrap_or_default();
                let categories = categories_by_book.remove(&row.id).unwrap_or_default();
                (
                    row.id,
                    Book {
                        id: row.id.into(),
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
                        publisher: Publisher {
                            id: row.publisher_id.into(),
                            name: row.publisher_name,
                        },
                        authors,
                        categories,
                    },
                )
            })
            .collect();

        // Page order comes from the id query, not this fetch.
        Ok(ids
            .iter()
            .filter_map(|id| books_by_id.remove(id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_from_param() {
        assert_eq!(SortKey::from_param("price_asc"), SortKey::PriceAsc);
        assert_eq!(SortKey::from_param("price_desc"), SortKey::PriceDesc);
        assert_eq!(SortKey::from_param("title"), SortKey::Title);
        assert_eq!(SortKey::from_param("newest"), SortKey::Newest);
        // unknown values fall back to newest
        assert_eq!(SortKey::from_param("garbage"), SortKey::Newest);
    }

    #[test]
    fn test_sort_key_has_id_tiebreak() {
        assert_eq!(SortKey::PriceAsc.order_clause(), "b.price ASC, b.id ASC");
        assert_eq!(SortKey::PriceDesc.order_clause(), "b.price DESC, b.id ASC");
        assert_eq!(SortKey::Title.order_clause(), "b.title ASC, b.id ASC");
        assert_eq!(SortKey::Newest.order_clause(), "b.id DESC");
    }

    #[test]
    fn test_filter_sql_no_filters() {
        let mut qb = QueryBuilder::new("SELECT b.id");
        push_filtered_from(&mut qb, &BookFilter::default());
        let sql = qb.sql();
        assert!(sql.contains("WHERE b.stock > 0"));
        assert!(!sql.contains("JOIN"));
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn test_filter_sql_category_joins_junction() {
        let filter = BookFilter {
            category_id: Some(CategoryId::new(3)),
            ..BookFilter::default()
        };
        let mut qb = QueryBuilder::new("SELECT b.id");
        push_filtered_from(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("LEFT JOIN book_category bc"));
        assert!(sql.contains("bc.category_id = $1"));
    }

    #[test]
    fn test_filter_sql_search_joins_authors() {
        let filter = BookFilter {
            search: Some("hugo".to_string()),
            ..BookFilter::default()
        };
        let mut qb = QueryBuilder::new("SELECT b.id");
        push_filtered_from(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("LEFT JOIN book_author ba"));
        assert!(sql.contains("b.title ILIKE $1"));
        assert!(sql.contains("b.isbn ILIKE $2"));
        assert!(sql.contains("a.first_name || ' ' || a.last_name ILIKE $3"));
    }

    #[test]
    fn test_filter_sql_all_filters_are_conjunctive() {
        let filter = BookFilter {
            category_id: Some(CategoryId::new(1)),
            publisher_id: Some(PublisherId::new(2)),
            price_min: Some(Decimal::new(500, 2)),
            price_max: Some(Decimal::new(2000, 2)),
            search: Some("ink".to_string()),
        };
        let mut qb = QueryBuilder::new("SELECT b.id");
        push_filtered_from(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("bc.category_id = $1"));
        assert!(sql.contains("b.publisher_id = $2"));
        assert!(sql.contains("b.price >= $3"));
        assert!(sql.contains("b.price <= $4"));
        assert!(sql.contains("b.title ILIKE $5"));
        assert_eq!(sql.matches(" AND ").count(), 5);
    }
}
