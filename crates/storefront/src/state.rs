//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{BackendClient, BackendError};
use crate::cart::CartSessions;
use crate::config::StorefrontConfig;
use crate::storage::KeyValueStorage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend client, the visitors' carts and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    carts: CartSessions,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `storage` - Where visitors' carts are persisted
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.api)?;
        let carts = CartSessions::new(
            storage,
            config.cart.storage_key.clone(),
            config.cart.idle_timeout,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                carts,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the visitors' carts.
    #[must_use]
    pub fn carts(&self) -> &CartSessions {
        &self.inner.carts
    }
}
