//! Sanital Storefront library.
//!
//! This crate provides the storefront API as a library, allowing it to be
//! tested in-process and reused by the CLI.
//!
//! # Modules
//!
//! - [`cart`] - Storage-backed cart container and per-visitor cart registry
//! - [`storage`] - Synchronous key/value persistence for carts
//! - [`backend`] - REST client for the catalog, auth and orders backend
//! - [`catalog`] - Category, search and featured queries over the catalog
//! - [`services`] - Auth, checkout and CSV import logic
//! - [`routes`] / [`middleware`] - The JSON HTTP API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::{Router, http::Request, routing::get};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router with its middleware stack.
///
/// Sentry layers are added by the binary, outside this router, so tests can
/// drive the app without a Sentry hub.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes().layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::cart_cookie_middleware,
        )))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
