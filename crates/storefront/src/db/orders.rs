//! Order repository: order-history reads for the profile page.
//!
//! Orders are only ever *written* by the checkout service
//! (`services::checkout`), which owns the transaction.

use std::collections::HashMap;

use sqlx::PgPool;

use mybookstore_core::{CustomerId, OrderId};

use super::RepositoryError;
use crate::models::order::{Order, OrderLine, OrderWithLines};

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All orders of a customer, most recent first, with their lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderWithLines>, RepositoryError> {
        let orders: Vec<Order> = sqlx::query_as(
            "SELECT id, customer_id, ordered_at, status, total_amount, \
                    shipping_address, shipping_city, shipping_postal_code \
             FROM customer_order \
             WHERE customer_id = $1 \
             ORDER BY ordered_at DESC, id DESC",
        )
        .bind(customer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let lines: Vec<OrderLine> = sqlx::query_as(
            "SELECT ol.id, ol.order_id, ol.book_id, b.title AS book_title, \
                    ol.quantity, ol.unit_price \
             FROM order_line ol \
             JOIN book b ON b.id = ol.book_id \
             WHERE ol.order_id = ANY($1) \
             ORDER BY ol.id",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut lines_by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            lines_by_order.entry(line.order_id).or_default().push(line);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let lines = lines_by_order.remove(&order.id).unwrap_or_default();
                OrderWithLines { order, lines }
            })
            .collect())
    }
}
