//! Order domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mybookstore_core::{BookId, CustomerId, LineItemId, OrderId, OrderStatus};

/// A persisted customer order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub ordered_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_postal_code: Option<String>,
}

/// A line of an order, with the unit price frozen at order time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderLine {
    pub id: LineItemId,
    pub order_id: OrderId,
    pub book_id: BookId,
    pub book_title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderLine {
    /// Line total: unit price at order time times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An order together with its lines, as shown on the profile page.
#[derive(Debug, Clone)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let line = OrderLine {
            id: LineItemId::new(1),
            order_id: OrderId::new(1),
            book_id: BookId::new(1),
            book_title: "Les Misérables".to_string(),
            quantity: 3,
            unit_price: Decimal::new(1250, 2),
        };
        assert_eq!(line.line_total(), Decimal::new(3750, 2));
    }
}
