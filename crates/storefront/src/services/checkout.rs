//! Order submission.
//!
//! Turns the visitor's cart and shipping form into a backend order. The cart
//! is cleared only after the backend has accepted the order; on any failure
//! it is left untouched so the visitor can retry.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use sanital_core::{Cart, PaymentMethod, PaymentStatus, Price};

use crate::backend::{
    Address, BackendClient, BackendError, Financials, OrderConfirmation, OrderLine, OrderRequest,
    PaymentInfo,
};
use crate::cart::CartStore;

/// Country written on every shipping address; the shop ships within Italy only.
pub const SHIPPING_COUNTRY: &str = "Italia";

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A required form field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The backend rejected or failed the order.
    #[error("order submission failed: {0}")]
    Backend(#[from] BackendError),
}

/// Shipping form as submitted at checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub province: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    fn validate(&self) -> Result<(), CheckoutError> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("zip", &self.zip),
            ("province", &self.province),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(CheckoutError::MissingField(name)),
            None => Ok(()),
        }
    }

    fn address(&self) -> Address {
        Address {
            street: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.province.trim().to_string(),
            zip: self.zip.trim().to_string(),
            country: SHIPPING_COUNTRY.to_string(),
            phone: self.phone.trim().to_string(),
            full_name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
        }
    }
}

/// Build the backend order for `cart`.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty cart and
/// `CheckoutError::MissingField` for a blank required field.
pub fn build_order(cart: &Cart, form: &CheckoutForm) -> Result<OrderRequest, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    form.validate()?;

    let products = cart
        .items()
        .iter()
        .map(|item| OrderLine {
            product: item.product().id.clone(),
            quantity: item.quantity(),
            price: item.product().price,
        })
        .collect();

    let subtotal = cart.total_price();
    let address = form.address();

    Ok(OrderRequest {
        products,
        shipping_address: address.clone(),
        billing_address: address,
        payment: PaymentInfo {
            method: form.payment_method,
            status: PaymentStatus::Pending,
        },
        financials: Financials {
            subtotal,
            tax: Price::ZERO,
            shipping: Price::ZERO,
            discount: Price::ZERO,
            grand_total: subtotal,
        },
        notes: form.notes.trim().to_string(),
    })
}

/// Checkout service.
pub struct CheckoutService<'a> {
    backend: &'a BackendClient,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// Submit the cart as an order and clear it once the backend accepts it.
    ///
    /// # Errors
    ///
    /// Returns the validation error from [`build_order`], or
    /// `CheckoutError::Backend` if submission fails. The cart is unchanged
    /// on error.
    #[instrument(skip(self, token, cart, form), fields(cart_key = %cart.key()))]
    pub async fn place_order(
        &self,
        token: &SecretString,
        cart: &mut CartStore,
        form: &CheckoutForm,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let order = build_order(cart.cart(), form)?;
        let confirmation = self.backend.create_order(token, &order).await?;

        info!(
            order_id = ?confirmation.id,
            total = %order.financials.grand_total,
            "Order placed"
        );
        cart.clear();
        Ok(confirmation)
    }
}
