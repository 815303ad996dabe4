//! Local cart commands.
//!
//! The cart lives in `<dir>/<key>.json`, written after every change exactly
//! like the storefront writes a visitor's cart.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use sanital_core::{ProductId, ProductRef};
use sanital_storefront::backend::{BackendClient, BackendError};
use sanital_storefront::cart::CartStore;
use sanital_storefront::config::BackendConfig;
use sanital_storefront::storage::{FileStorage, StorageError};
use thiserror::Error;
use url::Url;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Cart directory could not be opened.
    #[error("Cart storage error: {0}")]
    Storage(#[from] StorageError),

    /// Product lookup failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Open (hydrating) the cart stored under `key` in `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn open(dir: &Path, key: &str) -> Result<CartStore, CartCommandError> {
    let storage = FileStorage::open(dir)?;
    Ok(CartStore::hydrate(Arc::new(storage), key))
}

/// Add `quantity` units of product `id`, snapshotting it from the catalog.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn add(
    cart: &mut CartStore,
    api_url: Url,
    id: &str,
    quantity: u32,
) -> Result<(), CartCommandError> {
    let backend = BackendClient::new(&BackendConfig::new(api_url))?;
    let product = backend.get_product(&ProductId::new(id)).await?;

    tracing::info!("Adding {} x {} ({})", quantity, product.name, product.price);
    cart.add_item(ProductRef::from(product), quantity);
    Ok(())
}

/// Set the quantity of product `id`.
pub fn set(cart: &mut CartStore, id: &str, quantity: i64) {
    let id = ProductId::new(id);
    if cart.cart().get(&id).is_none() {
        tracing::warn!("Product {} is not in the cart", id);
    }
    cart.set_quantity(&id, quantity);
}

/// Remove product `id`.
pub fn remove(cart: &mut CartStore, id: &str) {
    let id = ProductId::new(id);
    if cart.cart().get(&id).is_none() {
        tracing::warn!("Product {} is not in the cart", id);
    }
    cart.remove_item(&id);
}

/// Empty the cart.
pub fn clear(cart: &mut CartStore) {
    cart.clear();
    tracing::info!("Cart cleared");
}

/// Print the cart.
#[allow(clippy::print_stdout)]
pub fn show(cart: &CartStore) {
    print!("{}", render(cart));
}

fn render(cart: &CartStore) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in cart.items() {
        let product = item.product();
        let _ = writeln!(
            out,
            "{:<12} {:<32} {:>4} x {:>10} = {:>10}",
            product.id.as_str(),
            product.name,
            item.quantity(),
            product.price.to_string(),
            item.line_total().to_string(),
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), total {}",
        cart.total_items(),
        cart.total_price()
    );
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sanital_core::Price;
    use sanital_storefront::storage::MemoryStorage;

    fn store() -> CartStore {
        CartStore::hydrate(Arc::new(MemoryStorage::new()), "sanital_cart")
    }

    fn product(id: &str, cents: u32) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            name: format!("Prodotto {id}"),
            price: Price::from_cents(cents),
            category: "Detergenti".to_string(),
            image: None,
        }
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&store()), "Cart is empty\n");
    }

    #[test]
    fn test_render_lines_and_totals() {
        let mut cart = store();
        cart.add_item(product("P1", 1000), 2);
        cart.add_item(product("P2", 250), 1);

        let text = render(&cart);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("P1"));
        assert!(lines[0].ends_with("€20.00"));
        assert_eq!(lines[2], "3 item(s), total €22.50");
    }

    #[test]
    fn test_set_and_remove() {
        let mut cart = store();
        cart.add_item(product("P1", 1000), 2);
        set(&mut cart, "P1", 5);
        assert_eq!(cart.total_items(), 5);
        set(&mut cart, "P1", -1);
        assert!(cart.is_empty());

        cart.add_item(product("P2", 100), 1);
        remove(&mut cart, "missing");
        remove(&mut cart, "P2");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_open_persists_between_runs() {
        let dir = std::env::temp_dir().join(format!("sanital-cli-{}", std::process::id()));
        {
            let mut cart = open(&dir, "sanital_cart").unwrap();
            cart.clear();
            cart.add_item(product("P1", 1000), 3);
        }
        let cart = open(&dir, "sanital_cart").unwrap();
        assert_eq!(cart.total_items(), 3);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
