//! Cart service: session persistence and the join against live book data.
//!
//! The raw cart (id -> quantity) lives in the session; this service loads
//! and stores it, and resolves entries to current book records for display
//! and checkout. Entries whose book no longer exists are silently dropped.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tower_sessions::Session;

use crate::db::RepositoryError;
use crate::db::books::BookRepository;
use crate::models::book::Book;
use crate::models::{Cart, session_keys};

/// A cart entry joined with its live book record.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub book: Book,
    pub quantity: u32,
}

impl CartLine {
    /// Line total at the book's *current* price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.book.price * Decimal::from(self.quantity)
    }
}

/// Sum of line totals over all surviving lines.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Load the cart from the session, empty if none is stored.
pub async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_cart(
    session: &Session,
    cart: &Cart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Remove the cart from the session entirely.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_cart(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(())
}

/// Cart service bound to the database.
pub struct CartService<'a> {
    books: BookRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            books: BookRepository::new(pool),
        }
    }

    /// Resolve the cart's entries against live book data.
    ///
    /// Entries whose book has been deleted are dropped without error; the
    /// cart itself is left untouched (it self-heals on the next store).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup fails.
    pub async fn lines(&self, cart: &Cart) -> Result<Vec<CartLine>, RepositoryError> {
        let ids: Vec<i32> = cart.book_ids().iter().map(|id| id.as_i32()).collect();
        let books = self.books.find_many(&ids).await?;

        Ok(books
            .into_iter()
            .map(|book| {
                let quantity = cart.quantity_of(book.id);
                CartLine { book, quantity }
            })
            .filter(|line| line.quantity > 0)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mybookstore_core::{BookId, PublisherId};
    use crate::models::book::Publisher;

    fn book(id: i32, price: Decimal) -> Book {
        Book {
            id: BookId::new(id),
            title: format!("Book {id}"),
            isbn: format!("978-000000000{id}"),
            page_count: 100,
            publication_date: None,
            price,
            stock: 10,
            copies_printed: 1000,
            language: "French".to_string(),
            description: None,
            cover_image: None,
            publisher: Publisher {
                id: PublisherId::new(1),
                name: "Gallimard".to_string(),
            },
            authors: vec![],
            categories: vec![],
        }
    }

    #[test]
    fn test_line_total_uses_current_price() {
        let line = CartLine {
            book: book(1, Decimal::new(1999, 2)),
            quantity: 3,
        };
        assert_eq!(line.line_total(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_cart_total_sums_lines() {
        let lines = vec![
            CartLine {
                book: book(1, Decimal::new(1000, 2)),
                quantity: 2,
            },
            CartLine {
                book: book(2, Decimal::new(550, 2)),
                quantity: 1,
            },
        ];
        assert_eq!(cart_total(&lines), Decimal::new(2550, 2));
    }

    #[test]
    fn test_cart_total_empty_is_zero() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }
}
