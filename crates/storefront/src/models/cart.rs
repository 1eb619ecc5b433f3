//! Session cart model.
//!
//! The cart is a plain serializable map from book id to requested quantity.
//! It lives under a single session key and never touches the database; the
//! join against live book data happens in `services::cart`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mybookstore_core::BookId;

/// A shopping cart: book id -> requested quantity.
///
/// Quantities are always >= 1; setting a quantity to zero removes the entry.
/// `BTreeMap` keeps iteration order stable across requests so the cart page
/// and the resulting order lines list books in a consistent order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: BTreeMap<BookId, u32>,
}

impl Cart {
    /// Add a book to the cart, incrementing the quantity if already present.
    pub fn add(&mut self, id: BookId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        *self.entries.entry(id).or_insert(0) += quantity;
    }

    /// Remove a book from the cart. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: BookId) {
        self.entries.remove(&id);
    }

    /// Set the quantity for a book already in the cart.
    ///
    /// A quantity of zero (the form sends 0 when the user empties the field)
    /// removes the entry. Ids not present in the cart are left untouched.
    pub fn set_quantity(&mut self, id: BookId, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
            return;
        }
        if let Some(current) = self.entries.get_mut(&id) {
            *current = quantity;
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Quantity currently requested for a book, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, id: BookId) -> u32 {
        self.entries.get(&id).copied().unwrap_or(0)
    }

    /// Total number of items across all entries.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.entries.values().sum()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (book id, quantity) pairs in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (BookId, u32)> + '_ {
        self.entries.iter().map(|(id, qty)| (*id, *qty))
    }

    /// Ids of all books in the cart, in stable order.
    #[must_use]
    pub fn book_ids(&self) -> Vec<BookId> {
        self.entries.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: i32) -> BookId {
        BookId::new(n)
    }

    #[test]
    fn test_add_accumulates_quantity() {
        let mut cart = Cart::default();
        cart.add(id(1), 2);
        cart.add(id(1), 3);
        assert_eq!(cart.quantity_of(id(1)), 5);
        assert_eq!(cart.total_items(), 5);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::default();
        cart.add(id(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        cart.add(id(1), 4);
        cart.set_quantity(id(1), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.quantity_of(id(1)), 0);
    }

    #[test]
    fn test_set_quantity_only_updates_existing() {
        let mut cart = Cart::default();
        cart.set_quantity(id(9), 3);
        assert!(cart.is_empty());

        cart.add(id(9), 1);
        cart.set_quantity(id(9), 3);
        assert_eq!(cart.quantity_of(id(9)), 3);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::default();
        cart.add(id(1), 1);
        cart.remove(id(2));
        assert_eq!(cart.quantity_of(id(1)), 1);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::default();
        cart.add(id(1), 1);
        cart.add(id(2), 2);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_iteration_order_is_stable() {
        let mut cart = Cart::default();
        cart.add(id(3), 1);
        cart.add(id(1), 1);
        cart.add(id(2), 1);
        let ids: Vec<i32> = cart.iter().map(|(id, _)| id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut cart = Cart::default();
        cart.add(id(1), 2);
        cart.add(id(7), 1);
        let json = serde_json::to_string(&cart).expect("serialize");
        let back: Cart = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, cart);
    }
}
