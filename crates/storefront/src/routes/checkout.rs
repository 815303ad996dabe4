//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use sanital_core::{OrderId, PaymentMethod};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::{RequireAuth, VisitorCart};
use crate::services::checkout::{CheckoutForm, CheckoutService};
use crate::state::AppState;

/// Outcome of a successful checkout.
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub order_id: Option<OrderId>,
    pub payment_method: PaymentMethod,
}

/// Place an order for the visitor's cart.
#[instrument(skip(state, user, cart, form), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    VisitorCart(cart): VisitorCart,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<OrderPlaced>)> {
    add_breadcrumb("checkout", "Checkout submitted", None);

    let mut cart = cart.lock().await;
    let confirmation = CheckoutService::new(state.backend())
        .place_order(&user.token(), &mut cart, &form)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlaced {
            order_id: confirmation.id,
            payment_method: form.payment_method,
        }),
    ))
}
