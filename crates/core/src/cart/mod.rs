//! The shopping cart model.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s, unique by product id, each
//! with a quantity of at least one. Totals are computed on every read and
//! never stored. The model is pure: persistence lives in [`persist`] and the
//! stateful, storage-backed container lives in the storefront crate.
//!
//! # Example
//!
//! ```
//! use sanital_core::cart::Cart;
//! use sanital_core::{Price, ProductId, ProductRef};
//!
//! let detergent = ProductRef {
//!     id: ProductId::new("P1"),
//!     name: "Detergente".to_string(),
//!     price: Price::from_cents(1000),
//!     category: "Pavimenti".to_string(),
//!     image: None,
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_item(detergent.clone(), 2);
//! assert_eq!(cart.total_items(), 2);
//! assert_eq!(cart.total_price(), Price::from_cents(2000));
//!
//! cart.add_item(detergent, 1);
//! assert_eq!(cart.total_price(), Price::from_cents(3000));
//!
//! cart.set_quantity(&ProductId::new("P1"), 0);
//! assert!(cart.is_empty());
//! ```

pub mod persist;

use serde::Serialize;

use crate::types::{Price, ProductId, ProductRef};

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    product: ProductRef,
    quantity: u32,
}

impl CartItem {
    /// The product snapshot taken when the line was created.
    #[must_use]
    pub const fn product(&self) -> &ProductRef {
        &self.product
    }

    /// Quantity, always at least one.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Desired purchase quantities per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add `quantity` units of `product`.
    ///
    /// Increments the existing line when the product is already in the cart,
    /// otherwise appends a new line. A zero quantity is ignored.
    pub fn add_item(&mut self, product: ProductRef, quantity: u32) {
        if quantity == 0 {
            return;
        }

        if let Some(item) = self.find_mut(&product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem { product, quantity });
        }
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product.id != product_id);
        self.items.len() != before
    }

    /// Overwrite the quantity for `product_id`.
    ///
    /// A quantity of zero or less removes the line. Unknown products are left
    /// alone. Returns whether the cart changed.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.find_mut(product_id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of quantity times unit price over all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product.id == product_id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn find_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product.id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, cents: u32) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            name: format!("Prodotto {id}"),
            price: Price::from_cents(cents),
            category: "Igiene".to_string(),
            image: None,
        }
    }

    #[test]
    fn test_repeated_adds_sum_quantities() {
        let mut cart = Cart::new();
        for quantity in [1, 4, 2, 7] {
            cart.add_item(product("P1", 100), quantity);
        }
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&ProductId::new("P1")).unwrap().quantity(), 14);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut cart = Cart::new();
        cart.add_item(product("B", 100), 1);
        cart.add_item(product("A", 100), 1);
        cart.add_item(product("B", 100), 1);
        let ids: Vec<&str> = cart.items().iter().map(|i| i.product().id.as_str()).collect();
        assert_eq!(ids, ["B", "A"]);
    }

    #[test]
    fn test_add_zero_is_ignored() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 100), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_keeps_first_snapshot() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 100), 1);
        cart.add_item(product("P1", 999), 1);
        assert_eq!(cart.total_price(), Price::from_cents(200));
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let mut a = Cart::new();
        a.add_item(product("P1", 100), 3);
        a.add_item(product("P2", 250), 1);
        let mut b = a.clone();

        assert!(a.set_quantity(&ProductId::new("P1"), 0));
        assert!(b.remove_item(&ProductId::new("P1")));
        assert_eq!(a, b);

        assert!(a.set_quantity(&ProductId::new("P2"), -5));
        assert!(a.is_empty());
    }

    #[test]
    fn test_set_quantity_overwrites() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 100), 3);
        assert!(cart.set_quantity(&ProductId::new("P1"), 10));
        assert!(!cart.set_quantity(&ProductId::new("P1"), 10));
        assert_eq!(cart.total_items(), 10);
        assert!(!cart.set_quantity(&ProductId::new("missing"), 4));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 100), 1);
        assert!(cart.remove_item(&ProductId::new("P1")));
        assert!(!cart.remove_item(&ProductId::new("P1")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 1000), 2);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), Price::from_cents(2000));

        cart.add_item(product("P1", 1000), 1);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), Price::from_cents(3000));

        cart.add_item(product("P2", 199), 2);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), Price::from_cents(3398));

        cart.set_quantity(&ProductId::new("P1"), 0);
        cart.set_quantity(&ProductId::new("P2"), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_quantity_saturates() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 1), u32::MAX);
        cart.add_item(product("P1", 1), 5);
        assert_eq!(cart.total_items(), u64::from(u32::MAX));

        cart.set_quantity(&ProductId::new("P1"), i64::MAX);
        assert_eq!(cart.items()[0].quantity(), u32::MAX);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 1), 1);
        cart.add_item(product("P2", 1), 1);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }
}
