//! Backend REST client implementation.
//!
//! Uses `reqwest` for HTTP. Caches the product list and single products
//! using `moka` (TTL from [`BackendConfig::catalog_ttl`]).

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use sanital_core::{CatalogRecord, Product, ProductId};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::types::{
    LoginRequest, LoginResponse, OrderConfirmation, OrderRequest, ProductUpdate, ProductsResponse,
    Profile, RegisterRequest,
};
use super::{BackendError, error_message};
use crate::config::BackendConfig;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend
    /// initialization fails).
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("sanital-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| BackendError::Url(e.to_string()))
    }

    /// `products/{id}` with the id percent-encoded as a single path segment.
    fn product_url(&self, id: &ProductId) -> Result<Url, BackendError> {
        let mut url = self.endpoint("products")?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Url(self.inner.base_url.to_string()))?
            .push(id.as_str());
        Ok(url)
    }

    /// Send a request and check its status, returning the response body.
    async fn send_raw(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let url = response.url().to_string();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        match status {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(url)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(BackendError::Unauthorized(message))
            }
            _ => {
                tracing::error!(
                    status = %status,
                    url = %url,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned non-success status"
                );
                Err(BackendError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Send a request and parse its JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send_raw(request).await?;
        // Empty bodies (204, or 201 with no content) read as JSON null
        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch the full catalog.
    ///
    /// Records that cannot be adapted (no identifier, unreadable price) are
    /// skipped with a warning rather than failing the whole listing.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>, BackendError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let url = self.endpoint("products")?;
        let response: ProductsResponse = self.send_json(self.inner.client.get(url)).await?;

        let products: Vec<Product> = response
            .into_records()
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match adapt_record(raw) {
                Ok(product) => Some(product),
                Err(reason) => {
                    warn!(index, reason = %reason, "Skipping unusable catalog record");
                    None
                }
            })
            .collect();

        debug!(count = products.len(), "Fetched product list");
        let products = Arc::new(products);
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Fetch one product by id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
            && let Some(product) = products.iter().find(|p| &p.id == id)
        {
            return Ok(product.clone());
        }

        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.product_url(id)?;
        let raw: Value = match self.send_json(self.inner.client.get(url)).await {
            Err(BackendError::NotFound(_)) => return Err(BackendError::NotFound(id.to_string())),
            other => other?,
        };
        if raw.is_null() {
            return Err(BackendError::NotFound(id.to_string()));
        }

        let product = adapt_record(raw).map_err(|reason| BackendError::Api {
            status: StatusCode::OK.as_u16(),
            message: format!("unusable product record: {reason}"),
        })?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop cached catalog data so the next read refetches it.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        debug!("Catalog cache invalidated");
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for an access token.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SecretString, BackendError> {
        let url = self.endpoint("auth/login")?;
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let response: LoginResponse = self
            .send_json(self.inner.client.post(url).json(&body))
            .await?;

        response
            .access_token
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .ok_or(BackendError::MissingToken)
    }

    /// Create a customer account.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<(), BackendError> {
        let url = self.endpoint("auth/register")?;
        self.send_raw(self.inner.client.post(url).json(request))
            .await?;
        Ok(())
    }

    /// Profile of the user owning `token`.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &SecretString) -> Result<Profile, BackendError> {
        let url = self.endpoint("users/profile")?;
        let profile: Option<Profile> = self
            .send_json(authorized(self.inner.client.get(url), token))
            .await?;
        Ok(profile.unwrap_or_default())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order on behalf of the user owning `token`.
    #[instrument(skip(self, token, order), fields(lines = order.products.len()))]
    pub async fn create_order(
        &self,
        token: &SecretString,
        order: &OrderRequest,
    ) -> Result<OrderConfirmation, BackendError> {
        let url = self.endpoint("orders")?;
        let body: Value = self
            .send_json(authorized(self.inner.client.post(url).json(order), token))
            .await?;
        Ok(OrderConfirmation::from_response(&body))
    }

    // =========================================================================
    // Catalog administration
    // =========================================================================

    /// Upload a catalog CSV. Invalidates the catalog cache on success.
    #[instrument(skip(self, token, contents), fields(bytes = contents.len()))]
    pub async fn upload_products_csv(
        &self,
        token: &SecretString,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("products/upload-csv")?;
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        self.send_raw(authorized(self.inner.client.post(url).multipart(form), token))
            .await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Partially update a product. Invalidates the catalog cache on success.
    #[instrument(skip(self, token, update), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<(), BackendError> {
        let url = self.product_url(id)?;
        self.send_raw(authorized(self.inner.client.patch(url).json(update), token))
            .await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Delete a product. Invalidates the catalog cache on success.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &SecretString,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        let url = self.product_url(id)?;
        self.send_raw(authorized(self.inner.client.delete(url), token))
            .await?;
        self.invalidate_catalog();
        Ok(())
    }
}

fn authorized(request: RequestBuilder, token: &SecretString) -> RequestBuilder {
    request.bearer_auth(token.expose_secret())
}

/// Adapt one raw record to the canonical product shape.
fn adapt_record(raw: Value) -> Result<Product, String> {
    let record: CatalogRecord = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    Product::try_from(record).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(&BackendConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let client = client("https://api.sanital.it/v1");
        assert_eq!(
            client.endpoint("auth/login").unwrap().as_str(),
            "https://api.sanital.it/v1/auth/login"
        );
    }

    #[test]
    fn test_product_url_encodes_id() {
        let client = client("https://api.sanital.it/");
        let url = client.product_url(&ProductId::new("a/b c")).unwrap();
        assert_eq!(url.as_str(), "https://api.sanital.it/products/a%2Fb%20c");
    }

    #[test]
    fn test_adapt_record() {
        let product = adapt_record(json!({"_id": "x1", "name": "Panno", "price": "2,50"})).unwrap();
        assert_eq!(product.id.as_str(), "x1");
        assert!(adapt_record(json!({"name": "orphan"})).is_err());
        assert!(adapt_record(json!("not an object")).is_err());
    }
}
