//! Request and response bodies exchanged with the backend.

use sanital_core::{OrderId, PaymentMethod, PaymentStatus, Price, ProductId, id_from_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// `GET /users/profile` response; older deployments use `_id`.
#[derive(Debug, Default, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Value,
    #[serde(default, rename = "_id")]
    pub legacy_id: Value,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Profile {
    /// The user's identifier, whichever field carries it.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        id_from_json(&self.id).or_else(|| id_from_json(&self.legacy_id))
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub products: Vec<OrderLine>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment: PaymentInfo,
    pub financials: Financials,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product: ProductId,
    pub quantity: u32,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub discount: Price,
    pub grand_total: Price,
}

/// What the backend acknowledged for a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderConfirmation {
    /// Order id, when the backend returned one.
    pub id: Option<OrderId>,
}

impl OrderConfirmation {
    /// Read the confirmation from whatever JSON the backend answered with.
    #[must_use]
    pub fn from_response(body: &Value) -> Self {
        let id = body
            .get("id")
            .and_then(id_from_json)
            .or_else(|| body.get("_id").and_then(id_from_json))
            .map(OrderId::new);
        Self { id }
    }
}

// =============================================================================
// Catalog administration
// =============================================================================

/// Body of `PATCH /products/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_homepage: Option<bool>,
}

impl ProductUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.img.is_none()
            && self.on_homepage.is_none()
    }
}

/// `GET /products` has answered both a bare array and `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductsResponse {
    List(Vec<Value>),
    Wrapped { data: Vec<Value> },
}

impl ProductsResponse {
    pub(crate) fn into_records(self) -> Vec<Value> {
        match self {
            Self::List(records) | Self::Wrapped { data: records } => records,
        }
    }
}
