//! Visitor cart id cookie and extractor.
//!
//! Each visitor is given a random cart id in a long-lived cookie, separate
//! from the session, so the cart behind it outlives restarts and logins.
//! [`cart_cookie_middleware`] reads or issues the id; [`VisitorCart`] looks
//! the cart up in [`crate::cart::CartSessions`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tower_sessions::cookie::{Cookie, SameSite, time};
use uuid::Uuid;

use crate::cart::CartHandle;
use crate::error::AppError;
use crate::state::AppState;

/// Cart id cookie name.
pub const CART_COOKIE_NAME: &str = "sanital_cart_id";

/// The requesting visitor's cart id, set by [`cart_cookie_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartId(pub String);

/// Middleware that makes sure every request carries a [`CartId`].
///
/// A missing or malformed cookie gets a fresh UUID, which is sent back in a
/// `Set-Cookie` lasting [`crate::config::CartConfig::max_age`].
pub async fn cart_cookie_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = cart_id_from_headers(request.headers());
    let issued = existing.is_none();
    let cart_id = existing.unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(CartId(cart_id.clone()));
    let mut response = next.run(request).await;

    if issued {
        let max_age = i64::try_from(state.config().cart.max_age.as_secs()).unwrap_or(i64::MAX);
        let cookie = Cookie::build((CART_COOKIE_NAME, cart_id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(state.config().is_secure())
            .max_age(time::Duration::seconds(max_age))
            .build();
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// The cart id cookie, when present and a well-formed UUID.
fn cart_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == CART_COOKIE_NAME)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .map(|id| id.to_string())
}

/// The requesting visitor's cart.
///
/// # Example
///
/// ```rust,ignore
/// async fn count(VisitorCart(cart): VisitorCart) -> String {
///     cart.lock().await.total_items().to_string()
/// }
/// ```
pub struct VisitorCart(pub CartHandle);

impl FromRequestParts<AppState> for VisitorCart {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CartId(cart_id) = parts
            .extensions
            .get::<CartId>()
            .cloned()
            .ok_or_else(|| AppError::Internal("cart cookie layer not installed".to_string()))?;

        let cart = state.carts().get(&cart_id).await;
        tracing::debug!(
            cart_id = %cart_id,
            live_carts = state.carts().live_carts(),
            "Visitor cart resolved"
        );
        Ok(Self(cart))
    }
}
