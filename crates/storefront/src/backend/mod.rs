//! Client for the Sanital backend REST API.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The backend is the source of truth - NO local sync, direct API calls
//! - The product list is cached in memory via `moka` (TTL from config)
//! - Raw product records are adapted to [`sanital_core::Product`] here, once
//!
//! # Endpoints used
//!
//! ```text
//! GET    /products               - catalog
//! GET    /products/{id}          - single product
//! PATCH  /products/{id}          - admin edit
//! DELETE /products/{id}          - admin delete
//! POST   /products/upload-csv    - admin CSV import (multipart "file")
//! POST   /auth/login             - returns { access_token }
//! POST   /auth/register
//! GET    /users/profile          - current user (bearer token)
//! POST   /orders                 - submit an order (bearer token)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sanital_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.api)?;
//! let products = client.list_products().await?;
//! let detergent = client.get_product(&ProductId::new("P1")).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid endpoint URL: {0}")]
    Url(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bearer token was missing, expired or lacks permission.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("Backend returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Login succeeded but the response carried no `access_token`.
    #[error("No access_token in login response")]
    MissingToken,
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers errors with `{"message": "..."}` or, for validation
/// failures, `{"message": ["...", "..."]}`. Anything else is returned as
/// (truncated) text.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    match parsed.as_ref().and_then(|v| v.get("message")) {
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(serde_json::Value::Array(messages)) => messages
            .iter()
            .map(|m| match m {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => body.chars().take(200).collect(),
    }
}
