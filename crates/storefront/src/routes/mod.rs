//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Health check
//!
//! # Products
//! GET    /api/products?category=&q=       - Listing, category filter or search
//! GET    /api/products/featured           - Homepage products
//! GET    /api/products/categories         - Categories with counts
//! GET    /api/products/{id}               - Product detail
//!
//! # Cart (answers with the updated cart)
//! GET    /api/cart                        - Cart contents and totals
//! GET    /api/cart/count                  - Item count badge
//! POST   /api/cart/add                    - {product_id, quantity?}
//! POST   /api/cart/update                 - {product_id, quantity}
//! POST   /api/cart/remove                 - {product_id}
//! POST   /api/cart/clear
//!
//! # Auth
//! POST   /api/auth/login                  - {email, password}
//! POST   /api/auth/register
//! POST   /api/auth/logout
//! GET    /api/auth/me                     - (requires auth)
//!
//! # Checkout
//! POST   /api/checkout                    - (requires auth)
//!
//! # Admin (requires admin role)
//! POST   /api/admin/products/upload-csv   - multipart field "file"
//! PATCH  /api/admin/products/{id}
//! DELETE /api/admin/products/{id}
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use crate::services::import::MAX_CSV_BYTES;
use crate::state::AppState;

/// Multipart framing allowance on top of the CSV itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/categories", get(products::categories))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products/upload-csv",
            post(admin::upload_csv)
                .layer(DefaultBodyLimit::max(MAX_CSV_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route(
            "/products/{id}",
            patch(admin::update_product).delete(admin::delete_product),
        )
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/auth", auth_routes())
        .route("/api/checkout", post(checkout::place_order))
        .nest("/api/admin", admin_routes())
}
