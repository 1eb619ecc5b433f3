//! Order administration queries: list, detail, status transitions.
//!
//! Orders are created exclusively by the storefront's checkout; the back
//! office only ever changes their status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use mybookstore_core::{OrderId, OrderStatus};

use super::{RepositoryError, page_count, page_offset};

/// An order row on the admin list page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderListRow {
    pub id: i32,
    pub customer_email: String,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub line_count: i64,
}

/// Full order detail.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDetail {
    pub id: i32,
    pub customer_email: String,
    pub customer_name: String,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_postal_code: Option<String>,
}

/// A line of an order detail.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDetailLine {
    pub book_id: i32,
    pub book_title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// One page of the order list.
#[derive(Debug)]
pub struct OrderListPage {
    pub rows: Vec<OrderListRow>,
    pub total: u64,
    pub total_pages: u32,
}

/// Repository for order administration.
pub struct OrderAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: u32,
        per_page: u32,
    ) -> Result<OrderListPage, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customer_order WHERE $1::order_status IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;
        let total = u64::try_from(total).unwrap_or(0);

        let rows = sqlx::query_as(
            "SELECT o.id, c.email AS customer_email, o.ordered_at, o.status, o.total_amount, \
                    (SELECT COUNT(*) FROM order_line ol WHERE ol.order_id = o.id) AS line_count \
             FROM customer_order o \
             JOIN customer c ON c.id = o.customer_id \
             WHERE $1::order_status IS NULL OR o.status = $1 \
             ORDER BY o.ordered_at DESC, o.id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(status)
        .bind(i64::from(per_page))
        .bind(page_offset(page, per_page))
        .fetch_all(self.pool)
        .await?;

        Ok(OrderListPage {
            rows,
            total,
            total_pages: page_count(total, per_page),
        })
    }

    /// Load one order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn get(
        &self,
        id: OrderId,
    ) -> Result<(OrderDetail, Vec<OrderDetailLine>), RepositoryError> {
        let detail: Option<OrderDetail> = sqlx::query_as(
            "SELECT o.id, c.email AS customer_email, \
                    c.first_name || ' ' || c.last_name AS customer_name, \
                    o.ordered_at, o.status, o.total_amount, \
                    o.shipping_address, o.shipping_city, o.shipping_postal_code \
             FROM customer_order o \
             JOIN customer c ON c.id = o.customer_id \
             WHERE o.id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        let detail = detail.ok_or(RepositoryError::NotFound)?;

        let lines = sqlx::query_as(
            "SELECT ol.book_id, b.title AS book_title, ol.quantity, ol.unit_price \
             FROM order_line ol \
             JOIN book b ON b.id = ol.book_id \
             WHERE ol.order_id = $1 \
             ORDER BY ol.id",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok((detail, lines))
    }

    /// Change an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE customer_order SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
