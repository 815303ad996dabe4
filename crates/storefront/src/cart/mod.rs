//! Storage-backed cart container.
//!
//! [`CartStore`] wraps a [`Cart`] and mirrors it to a [`KeyValueStorage`]
//! under a fixed key:
//!
//! - hydrated once, when the store is created
//! - re-serialized in full after every mutation
//! - storage failures are logged and swallowed; the in-memory cart remains
//!   the source of truth for the session
//!
//! [`CartSessions`] hands out one store per visitor for the HTTP service.

mod sessions;

pub use sessions::{CartHandle, CartSessions, update_blocking};

use std::sync::Arc;

use sanital_core::cart::persist::{self, Hydrated};
use sanital_core::{Cart, CartItem, Price, ProductId, ProductRef};
use tracing::{debug, error, warn};

use crate::storage::{KeyValueStorage, StorageError};

/// A cart persisted under a storage key.
pub struct CartStore {
    cart: Cart,
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Load the cart stored under `key`.
    ///
    /// Never fails: an unreadable backend yields an empty cart, an unreadable
    /// blob is deleted and yields an empty cart, and unreadable entries are
    /// dropped one by one.
    pub fn hydrate(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = match storage.get(&key) {
            Ok(Some(blob)) => Self::decode_blob(storage.as_ref(), &key, &blob),
            Ok(None) => Cart::new(),
            Err(e @ StorageError::Corrupt { .. }) => {
                warn!(key = %key, error = %e, "Discarding unreadable persisted cart");
                Self::discard(storage.as_ref(), &key);
                Cart::new()
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read persisted cart");
                Cart::new()
            }
        };

        debug!(key = %key, lines = cart.len(), "Cart hydrated");
        Self { cart, storage, key }
    }

    fn decode_blob(storage: &dyn KeyValueStorage, key: &str, blob: &str) -> Cart {
        match persist::decode(blob) {
            Ok(Hydrated { cart, dropped }) => {
                for entry in &dropped {
                    warn!(
                        key = %key,
                        index = entry.index,
                        reason = %entry.reason,
                        "Dropped unreadable cart entry"
                    );
                }
                cart
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable persisted cart");
                Self::discard(storage, key);
                Cart::new()
            }
        }
    }

    fn discard(storage: &dyn KeyValueStorage, key: &str) {
        if let Err(e) = storage.remove(key) {
            error!(key = %key, error = %e, "Failed to remove unreadable cart");
        }
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    pub fn add_item(&mut self, product: ProductRef, quantity: u32) {
        self.cart.add_item(product, quantity);
        self.persist();
    }

    /// Remove the line for `product_id`, if present.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.cart.remove_item(product_id);
        self.persist();
    }

    /// Overwrite a line's quantity; zero or less removes it.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        self.cart.set_quantity(product_id, quantity);
        self.persist();
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.persist();
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.cart.total_items()
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        self.cart.total_price()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// The underlying cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The storage key this cart is written under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn persist(&self) {
        let blob = match persist::encode(&self.cart) {
            Ok(blob) => blob,
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to serialize cart");
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.key, &blob) {
            error!(key = %self.key, error = %e, "Failed to persist cart");
        }
    }
}
