//! Checkout service: turns the session cart into a persisted order.
//!
//! The whole transition is one database transaction. Stock rows are locked
//! with `FOR UPDATE` before validation, so two simultaneous checkouts
//! against the same book serialize on the row lock and the second sees the
//! decremented stock. Nothing is committed unless every line fits.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use mybookstore_core::{BookId, OrderId, OrderStatus};

use crate::db::RepositoryError;
use crate::models::Cart;
use crate::models::user::Customer;

/// Errors from placing an order.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The cart has no (surviving) entries.
    #[error("your cart is empty")]
    EmptyCart,

    /// A requested quantity exceeds the book's current stock.
    #[error("\"{title}\" is no longer available in the requested quantity (stock: {available})")]
    InsufficientStock {
        /// Title of the offending book.
        title: String,
        /// Stock available at validation time.
        available: i32,
    },

    /// Underlying persistence failure; the transaction was rolled back.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// A validated, priced order line ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub book_id: BookId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// The successfully placed order, for the confirmation message.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub ordered_at: DateTime<Utc>,
    pub total: Decimal,
}

/// Current state of a book row, as read under the row lock.
#[derive(Debug, Clone, sqlx::FromRow)]
struct StockRow {
    id: i32,
    title: String,
    price: Decimal,
    stock: i32,
}

/// Validate cart entries against current stock and freeze unit prices.
///
/// Entries whose book no longer exists are dropped (mirroring the cart
/// page); any surviving entry whose quantity exceeds stock fails the whole
/// checkout. Returns the priced lines in cart order.
fn price_and_validate(
    cart: &Cart,
    stock: &HashMap<i32, StockRow>,
) -> Result<Vec<CheckoutLine>, CheckoutError> {
    let mut lines = Vec::new();

    for (book_id, quantity) in cart.iter() {
        let Some(row) = stock.get(&book_id.as_i32()) else {
            continue;
        };
        if i64::from(row.stock) < i64::from(quantity) {
            return Err(CheckoutError::InsufficientStock {
                title: row.title.clone(),
                available: row.stock,
            });
        }
        lines.push(CheckoutLine {
            book_id,
            title: row.title.clone(),
            quantity,
            unit_price: row.price,
        });
    }

    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    Ok(lines)
}

/// Order total: sum of unit price times quantity over all lines.
#[must_use]
fn order_total(lines: &[CheckoutLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum()
}

/// Checkout service bound to the database.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for the customer's cart.
    ///
    /// On success the order, its lines and the stock decrements are
    /// committed atomically. The caller clears the session cart afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or
    /// `CheckoutError::InsufficientStock` as user-facing validation errors;
    /// `CheckoutError::Repository` on persistence failure. In every error
    /// case nothing has been committed.
    #[tracing::instrument(skip(self, customer, cart), fields(customer_id = %customer.id))]
    pub async fn place_order(
        &self,
        customer: &Customer,
        cart: &Cart,
    ) -> Result<PlacedOrder, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let ids: Vec<i32> = cart.book_ids().iter().map(|id| id.as_i32()).collect();

        let mut tx = self.pool.begin().await?;

        // Lock the stock rows before validating against them.
        let rows: Vec<StockRow> = sqlx::query_as(
            "SELECT id, title, price, stock FROM book WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let stock: HashMap<i32, StockRow> = rows.into_iter().map(|r| (r.id, r)).collect();
        let lines = price_and_validate(cart, &stock)?;
        let total = order_total(&lines);

        let (order_id, ordered_at): (i32, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO customer_order \
               (customer_id, status, total_amount, shipping_address, shipping_city, shipping_postal_code) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, ordered_at",
        )
        .bind(customer.id.as_i32())
        .bind(OrderStatus::Pending)
        .bind(total)
        .bind(customer.address.as_deref())
        .bind(customer.city.as_deref())
        .bind(customer.postal_code.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                "INSERT INTO order_line (order_id, book_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(line.book_id.as_i32())
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE book SET stock = stock - $1 WHERE id = $2")
                .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
                .bind(line.book_id.as_i32())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id, %total, "order placed");

        Ok(PlacedOrder {
            id: OrderId::new(order_id),
            ordered_at,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, title: &str, price: Decimal, stock: i32) -> (i32, StockRow) {
        (
            id,
            StockRow {
                id,
                title: title.to_string(),
                price,
                stock,
            },
        )
    }

    #[test]
    fn test_price_and_validate_freezes_prices_and_totals() {
        let mut cart = Cart::default();
        cart.add(BookId::new(1), 2);
        cart.add(BookId::new(2), 1);

        let stock: HashMap<i32, StockRow> = [
            row(1, "A", Decimal::new(1000, 2), 5),
            row(2, "B", Decimal::new(750, 2), 3),
        ]
        .into_iter()
        .collect();

        let lines = price_and_validate(&cart, &stock).expect("valid cart");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price, Decimal::new(1000, 2));
        // total = 10.00 * 2 + 7.50 * 1 = 27.50
        assert_eq!(order_total(&lines), Decimal::new(2750, 2));
    }

    #[test]
    fn test_insufficient_stock_fails_whole_checkout() {
        let mut cart = Cart::default();
        cart.add(BookId::new(1), 1);
        cart.add(BookId::new(2), 4);

        let stock: HashMap<i32, StockRow> = [
            row(1, "A", Decimal::new(1000, 2), 5),
            row(2, "B", Decimal::new(750, 2), 3),
        ]
        .into_iter()
        .collect();

        let err = price_and_validate(&cart, &stock).expect_err("must fail");
        match err {
            CheckoutError::InsufficientStock { title, available } => {
                assert_eq!(title, "B");
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_books_are_dropped() {
        let mut cart = Cart::default();
        cart.add(BookId::new(1), 1);
        cart.add(BookId::new(99), 2);

        let stock: HashMap<i32, StockRow> =
            [row(1, "A", Decimal::new(500, 2), 1)].into_iter().collect();

        let lines = price_and_validate(&cart, &stock).expect("valid cart");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].book_id, BookId::new(1));
    }

    #[test]
    fn test_cart_of_only_vanished_books_is_empty() {
        let mut cart = Cart::default();
        cart.add(BookId::new(99), 2);

        let stock = HashMap::new();
        assert!(matches!(
            price_and_validate(&cart, &stock),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_exact_stock_is_accepted() {
        let mut cart = Cart::default();
        cart.add(BookId::new(1), 3);

        let stock: HashMap<i32, StockRow> =
            [row(1, "A", Decimal::new(100, 2), 3)].into_iter().collect();

        assert!(price_and_validate(&cart, &stock).is_ok());
    }
}
