//! Cart route handlers.
//!
//! Every handler answers with the cart as it stands after the operation, so
//! clients never need a second round trip to refresh totals.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use sanital_core::{CartItem, Price, ProductId, ProductRef};

use crate::backend::BackendError;
use crate::cart::{CartHandle, CartStore, update_blocking};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::VisitorCart;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product: ProductRef,
    pub quantity: u32,
    pub price: String,
    pub line_total: Price,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: u64,
    pub total_price: Price,
    pub subtotal: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product: item.product().clone(),
            quantity: item.quantity(),
            price: item.product().price.to_string(),
            line_total: item.line_total(),
            line_price: item.line_total().to_string(),
        }
    }
}

impl From<&CartStore> for CartView {
    fn from(store: &CartStore) -> Self {
        let total_price = store.total_price();
        Self {
            items: store.items().iter().map(CartItemView::from).collect(),
            total_items: store.total_items(),
            total_price,
            subtotal: total_price.to_string(),
        }
    }
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCart {
    pub product_id: ProductId,
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart.
pub async fn show(VisitorCart(cart): VisitorCart) -> Json<CartView> {
    Json(CartView::from(&*cart.lock().await))
}

/// Item count for the header badge.
pub async fn count(VisitorCart(cart): VisitorCart) -> Json<Value> {
    Json(json!({ "count": cart.lock().await.total_items() }))
}

/// Add a product, snapshotting its current catalog data.
#[instrument(skip(state, cart), fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    VisitorCart(cart): VisitorCart,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartView>> {
    if body.quantity == 0 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let product = match state.backend().get_product(&body.product_id).await {
        Ok(product) => product,
        Err(BackendError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("product {}", body.product_id)));
        }
        Err(e) => return Err(e.into()),
    };

    let product = ProductRef::from(product);
    let quantity = body.quantity;
    let view = mutate(&cart, move |cart| cart.add_item(product, quantity)).await?;
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", body.product_id.as_str())]),
    );

    Ok(Json(view))
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(cart), fields(product_id = %body.product_id))]
pub async fn update(
    VisitorCart(cart): VisitorCart,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let UpdateQuantity {
        product_id,
        quantity,
    } = body;
    let view = mutate(&cart, move |cart| cart.set_quantity(&product_id, quantity)).await?;
    Ok(Json(view))
}

/// Remove a line.
#[instrument(skip(cart), fields(product_id = %body.product_id))]
pub async fn remove(
    VisitorCart(cart): VisitorCart,
    Json(body): Json<RemoveFromCart>,
) -> Result<Json<CartView>> {
    let product_id = body.product_id.clone();
    let view = mutate(&cart, move |cart| cart.remove_item(&product_id)).await?;
    add_breadcrumb(
        "cart",
        "Removed from cart",
        Some(&[("product_id", body.product_id.as_str())]),
    );
    Ok(Json(view))
}

/// Empty the cart.
#[instrument(skip(cart))]
pub async fn clear(VisitorCart(cart): VisitorCart) -> Result<Json<CartView>> {
    let view = mutate(&cart, CartStore::clear).await?;
    Ok(Json(view))
}

/// Apply `f` off the async runtime and return the updated cart.
async fn mutate<F>(cart: &CartHandle, f: F) -> Result<CartView>
where
    F: FnOnce(&mut CartStore) + Send + 'static,
{
    update_blocking(cart, move |cart| {
        f(cart);
        CartView::from(&*cart)
    })
    .await
    .map_err(|e| AppError::Internal(format!("cart update failed: {e}")))
}
