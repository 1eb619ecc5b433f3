//! Catalogue domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mybookstore_core::{AuthorId, BookId, CategoryId, PublisherId};

/// An author referenced by books.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub last_name: String,
}

impl Author {
    /// Full display name, `first_name last_name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A book category.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A publisher.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Publisher {
    pub id: PublisherId,
    pub name: String,
}

/// A book with its relations resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub isbn: String,
    pub page_count: i32,
    pub publication_date: Option<NaiveDate>,
    pub price: Decimal,
    pub stock: i32,
    pub copies_printed: i32,
    pub language: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub publisher: Publisher,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
}

impl Book {
    /// Whether the book can currently be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Comma-separated author names for display.
    #[must_use]
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(Author::full_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A paginated result envelope.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// An empty page that still reports correct totals.
    #[must_use]
    pub const fn empty(current_page: u32, per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            total_pages: 0,
            current_page,
            per_page,
        }
    }

    /// Number of pages needed for `total` items at `per_page` items each.
    #[must_use]
    pub fn page_count(total: u64, per_page: u32) -> u32 {
        if per_page == 0 {
            return 0;
        }
        u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
    }

    /// Whether a page beyond the first exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Whether another page follows the current one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(Page::<()>::page_count(0, 12), 0);
        assert_eq!(Page::<()>::page_count(1, 12), 1);
        assert_eq!(Page::<()>::page_count(12, 12), 1);
        assert_eq!(Page::<()>::page_count(13, 12), 2);
        assert_eq!(Page::<()>::page_count(24, 12), 2);
        assert_eq!(Page::<()>::page_count(25, 12), 3);
    }

    #[test]
    fn test_page_navigation_flags() {
        let page = Page::<()> {
            items: vec![],
            total: 30,
            total_pages: 3,
            current_page: 2,
            per_page: 12,
        };
        assert!(page.has_previous());
        assert!(page.has_next());

        let last = Page::<()> {
            current_page: 3,
            ..page
        };
        assert!(!last.has_next());
    }

    #[test]
    fn test_author_full_name() {
        let author = Author {
            id: AuthorId::new(1),
            first_name: "Victor".to_string(),
            last_name: "Hugo".to_string(),
        };
        assert_eq!(author.full_name(), "Victor Hugo");
    }
}
