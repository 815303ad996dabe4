//! Per-visitor cart stores for the HTTP service.
//!
//! Each visitor's session carries a random cart id; their cart is persisted
//! under `<storage key>:<cart id>`. Live stores are kept in a `moka` cache and
//! dropped after a period of inactivity. A dropped store loses nothing, since
//! every mutation was already written through; the next request hydrates it
//! again.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use tokio::task::JoinError;

use super::CartStore;
use crate::storage::KeyValueStorage;

/// Shared, lockable handle to one visitor's cart.
pub type CartHandle = Arc<Mutex<CartStore>>;

/// Lock `handle` and run `f` on the blocking thread pool.
///
/// Every cart mutation writes through to storage, which may be the
/// filesystem; the lock is held until `f` returns.
///
/// # Errors
///
/// Returns the join error if `f` panicked.
pub async fn update_blocking<R, F>(handle: &CartHandle, f: F) -> Result<R, JoinError>
where
    R: Send + 'static,
    F: FnOnce(&mut CartStore) -> R + Send + 'static,
{
    let mut cart = Arc::clone(handle).lock_owned().await;
    tokio::task::spawn_blocking(move || f(&mut cart)).await
}

/// Registry of live cart stores, keyed by storage key.
#[derive(Clone)]
pub struct CartSessions {
    storage: Arc<dyn KeyValueStorage>,
    key_prefix: String,
    carts: Cache<String, CartHandle>,
}

impl CartSessions {
    /// Create a registry writing to `storage`.
    ///
    /// No capacity bound is set: only idle carts are evicted, so a handle in
    /// use is never replaced by a second store for the same key.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        key_prefix: impl Into<String>,
        idle_timeout: Duration,
    ) -> Self {
        let carts = Cache::builder().time_to_idle(idle_timeout).build();

        Self {
            storage,
            key_prefix: key_prefix.into(),
            carts,
        }
    }

    /// Storage key for a visitor's cart id.
    #[must_use]
    pub fn storage_key(&self, cart_id: &str) -> String {
        format!("{}:{cart_id}", self.key_prefix)
    }

    /// The cart for `cart_id`, hydrating it on first use.
    pub async fn get(&self, cart_id: &str) -> CartHandle {
        let key = self.storage_key(cart_id);
        let storage = Arc::clone(&self.storage);

        self.carts
            .get_with(key.clone(), async move {
                Arc::new(Mutex::new(CartStore::hydrate(storage, key)))
            })
            .await
    }

    /// Number of carts currently held in memory.
    #[must_use]
    pub fn live_carts(&self) -> u64 {
        self.carts.entry_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use sanital_core::{Price, ProductId, ProductRef};

    fn product(id: &str) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            name: id.to_string(),
            price: Price::from_cents(500),
            category: String::new(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_same_cart_id_shares_store() {
        let sessions = CartSessions::new(
            Arc::new(MemoryStorage::new()),
            "sanital_cart",
            Duration::from_secs(60),
        );

        sessions.get("a").await.lock().await.add_item(product("P1"), 2);
        let again = sessions.get("a").await;
        assert_eq!(again.lock().await.total_items(), 2);

        let other = sessions.get("b").await;
        assert!(other.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_carts_are_persisted_per_visitor() {
        let storage = Arc::new(MemoryStorage::new());
        let sessions = CartSessions::new(storage.clone(), "sanital_cart", Duration::from_secs(60));

        sessions.get("visitor-1").await.lock().await.add_item(product("P1"), 1);

        assert_eq!(sessions.storage_key("visitor-1"), "sanital_cart:visitor-1");
        assert!(storage.get("sanital_cart:visitor-1").unwrap().is_some());
        assert!(storage.get("sanital_cart:visitor-2").unwrap().is_none());

        // A fresh registry over the same storage sees the persisted cart
        let restarted = CartSessions::new(storage, "sanital_cart", Duration::from_secs(60));
        let cart = restarted.get("visitor-1").await;
        assert_eq!(cart.lock().await.total_price(), Price::from_cents(500));
    }

    #[tokio::test]
    async fn test_update_blocking_writes_through() {
        let storage = Arc::new(MemoryStorage::new());
        let sessions = CartSessions::new(storage.clone(), "sanital_cart", Duration::from_secs(60));
        let cart = sessions.get("v").await;

        let total = update_blocking(&cart, |cart| {
            cart.add_item(product("P1"), 3);
            cart.total_items()
        })
        .await
        .unwrap();

        assert_eq!(total, 3);
        assert_eq!(cart.lock().await.total_items(), 3);
        assert!(storage.get("sanital_cart:v").unwrap().is_some());
    }
}
