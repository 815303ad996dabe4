//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SANITAL_API_URL` - Base URL of the catalog/orders backend REST API
//!
//! ## Optional
//! - `SANITAL_HOST` - Bind address (default: 127.0.0.1)
//! - `SANITAL_PORT` - Listen port (default: 3000)
//! - `SANITAL_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `SANITAL_API_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `SANITAL_CATALOG_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SANITAL_CART_DIR` - Directory holding persisted carts (default: ./data/carts)
//! - `SANITAL_CART_KEY` - Storage key prefix for carts (default: `sanital_cart`)
//! - `SANITAL_CART_IDLE_SECS` - Evict idle in-memory carts after (default: 1800)
//! - `SANITAL_CART_MAX_AGE_DAYS` - Cart cookie lifetime; older carts are pruned (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sanital_core::cart::persist::DEFAULT_STORAGE_KEY;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Backend REST API configuration
    pub api: BackendConfig,
    /// Cart persistence configuration
    pub cart: CartConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL; endpoint paths such as `products` are joined onto it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long the product list stays cached
    pub catalog_ttl: Duration,
}

/// Cart persistence configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Directory of the file-backed cart storage
    pub storage_dir: PathBuf,
    /// Storage key; each visitor's cart lives under `<key>:<cart id>`
    pub storage_key: String,
    /// In-memory carts untouched for this long are dropped (they stay persisted)
    pub idle_timeout: Duration,
    /// Lifetime of the cart id cookie; persisted carts not written for this
    /// long are deleted at startup
    pub max_age: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("SANITAL_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("SANITAL_PORT", "3000")?;
        let base_url = get_env_or_default("SANITAL_BASE_URL", "http://localhost:3000");

        let api = BackendConfig::from_env()?;
        let cart = CartConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            api,
            cart,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration with defaults for everything except the backend URL.
    ///
    /// Used by tests and tools that do not read the environment.
    #[must_use]
    pub fn with_api_url(base_url: Url) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            api: BackendConfig::new(base_url),
            cart: CartConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Backend configuration with default timeout and cache lifetime.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            timeout: Duration::from_secs(15),
            catalog_ttl: Duration::from_secs(300),
        }
    }

    /// Load the backend section from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SANITAL_API_URL` is missing or any value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("SANITAL_API_URL")?;
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("SANITAL_API_URL".to_string(), e.to_string()))?;

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            timeout: Duration::from_secs(parse_env_or_default("SANITAL_API_TIMEOUT_SECS", "15")?),
            catalog_ttl: Duration::from_secs(parse_env_or_default(
                "SANITAL_CATALOG_TTL_SECS",
                "300",
            )?),
        })
    }
}

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data/carts"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            idle_timeout: Duration::from_secs(1800),
            max_age: Duration::from_secs(30 * SECONDS_PER_DAY),
        }
    }
}

impl CartConfig {
    /// Load the cart section from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            storage_dir: get_optional_env("SANITAL_CART_DIR")
                .map_or(defaults.storage_dir, PathBuf::from),
            storage_key: get_env_or_default("SANITAL_CART_KEY", &defaults.storage_key),
            idle_timeout: Duration::from_secs(parse_env_or_default(
                "SANITAL_CART_IDLE_SECS",
                "1800",
            )?),
            max_age: Duration::from_secs(
                parse_env_or_default::<u64>("SANITAL_CART_MAX_AGE_DAYS", "30")?
                    .saturating_mul(SECONDS_PER_DAY),
            ),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
