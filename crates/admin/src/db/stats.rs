//! Dashboard aggregates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;

/// Headline dashboard figures.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub total_books: i64,
    pub total_orders: i64,
    pub total_customers: i64,
    pub pending_orders: i64,
    /// Revenue over all non-cancelled orders.
    pub total_revenue: Decimal,
    pub low_stock_books: i64,
    pub stock_threshold: i32,
}

/// A best-selling book with units sold and revenue.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BestSeller {
    pub book_id: i32,
    pub title: String,
    pub units_sold: i64,
    pub revenue: Decimal,
}

/// A recent order for the dashboard feed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentOrder {
    pub id: i32,
    pub customer_email: String,
    pub ordered_at: DateTime<Utc>,
    pub total_amount: Decimal,
}

/// A book running low on stock.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LowStockBook {
    pub id: i32,
    pub title: String,
    pub stock: i32,
}

/// Repository for dashboard aggregates.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Gather the headline figures in one pass.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn dashboard(&self, stock_threshold: i32) -> Result<DashboardStats, RepositoryError> {
        let total_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book")
            .fetch_one(self.pool)
            .await?;
        let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_order")
            .fetch_one(self.pool)
            .await?;
        let total_customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(self.pool)
            .await?;
        let pending_orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customer_order WHERE status = 'pending'")
                .fetch_one(self.pool)
                .await?;
        let total_revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM customer_order WHERE status <> 'cancelled'",
        )
        .fetch_one(self.pool)
        .await?;
        let low_stock_books: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book WHERE stock < $1")
                .bind(stock_threshold)
                .fetch_one(self.pool)
                .await?;

        Ok(DashboardStats {
            total_books,
            total_orders,
            total_customers,
            pending_orders,
            total_revenue,
            low_stock_books,
            stock_threshold,
        })
    }

    /// Best-selling books over non-cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn best_sellers(&self, limit: i64) -> Result<Vec<BestSeller>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT b.id AS book_id, b.title, \
                    SUM(ol.quantity)::bigint AS units_sold, \
                    SUM(ol.quantity * ol.unit_price) AS revenue \
             FROM order_line ol \
             JOIN book b ON b.id = ol.book_id \
             JOIN customer_order o ON o.id = ol.order_id \
             WHERE o.status <> 'cancelled' \
             GROUP BY b.id, b.title \
             ORDER BY units_sold DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// The most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_orders(&self, limit: i64) -> Result<Vec<RecentOrder>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT o.id, c.email AS customer_email, o.ordered_at, o.total_amount \
             FROM customer_order o \
             JOIN customer c ON c.id = o.customer_id \
             ORDER BY o.ordered_at DESC, o.id DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Books under the stock threshold, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(
        &self,
        threshold: i32,
        limit: i64,
    ) -> Result<Vec<LowStockBook>, RepositoryError> {
        let rows = sqlx::query_as(
            "SELECT id, title, stock FROM book WHERE stock < $1 ORDER BY stock ASC, id ASC LIMIT $2",
        )
        .bind(threshold)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
