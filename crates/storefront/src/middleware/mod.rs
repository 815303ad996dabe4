//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with an in-memory store)
//! 5. Cart id cookie on `/api` routes (long-lived, issued on first visit)
//!
//! The extractors in [`auth`] read the session set up by (4); [`cart`]
//! reads the cart id set up by (5).

pub mod auth;
pub mod cart;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use cart::{CartId, VisitorCart, cart_cookie_middleware};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
