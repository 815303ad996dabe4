//! Catalog commands.
//!
//! # Environment Variables
//!
//! - `SANITAL_API_URL` - Backend base URL
//! - `SANITAL_ADMIN_PASSWORD` - Admin password for `import`

use std::path::Path;

use sanital_core::Product;
use sanital_storefront::backend::{BackendClient, BackendError};
use sanital_storefront::catalog;
use sanital_storefront::config::BackendConfig;
use sanital_storefront::services::auth::{AuthError, AuthService};
use sanital_storefront::services::import::{ImportError, validate_csv};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Errors that can occur during catalog commands.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Admin login failed.
    #[error("Login failed: {0}")]
    Auth(#[from] AuthError),

    /// The logged-in account is not an admin.
    #[error("{0} is not an admin account")]
    NotAdmin(String),

    /// CSV refused before upload.
    #[error("Invalid CSV: {0}")]
    Import(#[from] ImportError),

    /// CSV could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build a backend client for `api_url`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn client(api_url: Url) -> Result<BackendClient, CatalogError> {
    Ok(BackendClient::new(&BackendConfig::new(api_url))?)
}

/// Print products, optionally only one category.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn list(backend: &BackendClient, category: Option<&str>) -> Result<(), CatalogError> {
    let products = backend.list_products().await?;
    let selected = catalog::filter_by_category(&products, category);
    print_products(&selected);
    Ok(())
}

/// Print products matching `query`.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn search(backend: &BackendClient, query: &str, limit: usize) -> Result<(), CatalogError> {
    if query.trim().chars().count() < catalog::MIN_SEARCH_LEN {
        tracing::warn!(
            "Search needs at least {} characters",
            catalog::MIN_SEARCH_LEN
        );
        return Ok(());
    }

    let products = backend.list_products().await?;
    print_products(&catalog::search(&products, query, limit));
    Ok(())
}

/// Print categories with product counts.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn categories(backend: &BackendClient) -> Result<(), CatalogError> {
    let products = backend.list_products().await?;
    for category in catalog::categories(&products) {
        println!("{:<32} {:>5}", category.name, category.count);
    }
    Ok(())
}

/// Log in as an admin and upload a catalog CSV.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, the login fails,
/// the account is not an admin, or the upload is rejected.
pub async fn import(backend: &BackendClient, file: &Path, email: &str) -> Result<(), CatalogError> {
    let password = std::env::var("SANITAL_ADMIN_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| CatalogError::MissingEnvVar("SANITAL_ADMIN_PASSWORD"))?;

    let contents = std::fs::read(file).map_err(|source| CatalogError::Read {
        path: file.display().to_string(),
        source,
    })?;
    validate_csv(&contents)?;

    let user = AuthService::new(backend).login(email, &password).await?;
    if !user.is_admin() {
        return Err(CatalogError::NotAdmin(user.email));
    }

    let file_name = file
        .file_name()
        .map_or_else(|| "products.csv".to_string(), |n| n.to_string_lossy().into_owned());

    tracing::info!("Uploading {} ({} bytes)...", file_name, contents.len());
    backend
        .upload_products_csv(&user.token(), &file_name, contents)
        .await?;
    tracing::info!("Catalog imported successfully!");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_products(products: &[&Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for product in products {
        println!(
            "{:<12} {:<40} {:>10}  {}",
            product.id.as_str(),
            product.name,
            product.price.to_string(),
            product.category
        );
    }
}
