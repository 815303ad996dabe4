//! Cart persistence codec.
//!
//! The persisted form is a JSON array of `{ "product": {...}, "quantity": n }`
//! objects. Blobs written by older storefront builds carry prices as strings
//! with currency symbols, `_id` instead of `id`, or stray junk entries, so
//! [`decode`] repairs what it can and drops individual entries it cannot
//! read. Only a blob that is not a JSON array at all is rejected outright.

use serde_json::Value;

use super::Cart;
use crate::types::{CatalogRecord, ProductError, ProductRef};

/// Storage key the cart is kept under.
pub const DEFAULT_STORAGE_KEY: &str = "sanital_cart";

/// The blob as a whole could not be read.
#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    /// The blob is not JSON.
    #[error("persisted cart is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The blob is JSON, but not an array.
    #[error("persisted cart must be a JSON array, got {0}")]
    NotAnArray(&'static str),
}

/// Why a single persisted entry was discarded.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DropReason {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("entry has no product")]
    MissingProduct,
    #[error("product fields are malformed: {0}")]
    MalformedProduct(String),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error("quantity {0} is not a positive integer")]
    InvalidQuantity(Value),
}

/// A persisted entry that did not make it into the hydrated cart.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedEntry {
    /// Position of the entry in the persisted array.
    pub index: usize,
    pub reason: DropReason,
}

/// Result of reading a persisted blob.
#[derive(Debug, Clone, Default)]
pub struct Hydrated {
    pub cart: Cart,
    pub dropped: Vec<DroppedEntry>,
}

/// Serialize the whole cart.
///
/// # Errors
///
/// Returns an error only if serialization itself fails, which the cart's
/// types never cause in practice.
pub fn encode(cart: &Cart) -> Result<String, serde_json::Error> {
    serde_json::to_string(cart)
}

/// Read a persisted blob back into a cart.
///
/// Entries with a missing identifier, an unreadable price, or a quantity that
/// is not a positive integer are dropped and reported in
/// [`Hydrated::dropped`]. Entries repeating a product id are merged by summing
/// their quantities.
///
/// # Errors
///
/// Returns [`PersistError`] if the blob is not a JSON array.
pub fn decode(blob: &str) -> Result<Hydrated, PersistError> {
    let value: Value = serde_json::from_str(blob)?;
    let Value::Array(entries) = value else {
        return Err(PersistError::NotAnArray(json_type_name(&value)));
    };

    let mut hydrated = Hydrated::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match decode_entry(entry) {
            Ok((product, quantity)) => hydrated.cart.add_item(product, quantity),
            Err(reason) => hydrated.dropped.push(DroppedEntry { index, reason }),
        }
    }

    Ok(hydrated)
}

fn decode_entry(entry: Value) -> Result<(ProductRef, u32), DropReason> {
    let Value::Object(mut fields) = entry else {
        return Err(DropReason::NotAnObject);
    };

    let product = match fields.remove("product") {
        None | Some(Value::Null) => return Err(DropReason::MissingProduct),
        Some(product) => product,
    };
    let record: CatalogRecord = serde_json::from_value(product)
        .map_err(|e| DropReason::MalformedProduct(e.to_string()))?;
    let product = ProductRef::try_from(record)?;

    let quantity = fields.remove("quantity").unwrap_or(Value::Null);
    let quantity = quantity_from_json(&quantity).ok_or(DropReason::InvalidQuantity(quantity))?;

    Ok((product, quantity))
}

fn quantity_from_json(value: &Value) -> Option<u32> {
    let Value::Number(n) = value else {
        return None;
    };

    let whole = n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 1.0)
            .map(whole_float_to_u64)
    })?;

    (whole >= 1).then(|| u32::try_from(whole).unwrap_or(u32::MAX))
}

// Callers pass only non-negative whole numbers; `as` saturates above u64::MAX.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_float_to_u64(f: f64) -> u64 {
    f as u64
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Price, ProductId};
    use serde_json::json;

    fn product(id: &str, cents: u32) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            name: format!("Prodotto {id}"),
            price: Price::from_cents(cents),
            category: "Igiene".to_string(),
            image: Some(format!("/img/{id}.jpg")),
        }
    }

    #[test]
    fn test_round_trip() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 1999), 2);
        cart.add_item(product("P2", 450), 1);

        let blob = encode(&cart).unwrap();
        let hydrated = decode(&blob).unwrap();

        assert!(hydrated.dropped.is_empty());
        assert_eq!(hydrated.cart, cart);
    }

    #[test]
    fn test_encoded_shape() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 1000), 3);
        let value: Value = serde_json::from_str(&encode(&cart).unwrap()).unwrap();
        assert_eq!(
            value,
            json!([{
                "product": {
                    "id": "P1",
                    "name": "Prodotto P1",
                    "price": 10.0,
                    "category": "Igiene",
                    "img": "/img/P1.jpg"
                },
                "quantity": 3
            }])
        );
    }

    #[test]
    fn test_corrupt_entry_dropped_valid_kept() {
        let blob = json!([
            {"product": {"name": "no id", "price": 3}, "quantity": 1},
            {"product": {"id": "P2", "name": "ok", "price": 4.5}, "quantity": 2}
        ])
        .to_string();

        let hydrated = decode(&blob).unwrap();
        assert_eq!(hydrated.cart.len(), 1);
        assert_eq!(hydrated.cart.items()[0].product().id.as_str(), "P2");
        assert_eq!(hydrated.cart.total_price(), Price::from_cents(900));
        assert_eq!(
            hydrated.dropped,
            vec![DroppedEntry {
                index: 0,
                reason: DropReason::Product(ProductError::MissingId),
            }]
        );
    }

    #[test]
    fn test_legacy_string_prices_are_repaired() {
        let blob = json!([
            {"product": {"_id": "A", "name": "a", "price": "€ 12,50"}, "quantity": 2}
        ])
        .to_string();

        let hydrated = decode(&blob).unwrap();
        assert_eq!(hydrated.cart.total_price(), Price::from_cents(2500));
    }

    #[test]
    fn test_bad_entries_each_dropped() {
        let blob = json!([
            "junk",
            {"quantity": 1},
            {"product": {"id": "A", "price": "1.2.3"}, "quantity": 1},
            {"product": {"id": "B", "price": 1}, "quantity": 0},
            {"product": {"id": "C", "price": 1}, "quantity": "2"},
            {"product": {"id": "D", "name": 5, "price": 1}, "quantity": 1},
            {"product": {"id": "E", "price": 1}, "quantity": 2.0}
        ])
        .to_string();

        let hydrated = decode(&blob).unwrap();
        let dropped: Vec<usize> = hydrated.dropped.iter().map(|d| d.index).collect();
        assert_eq!(dropped, [0, 1, 2, 3, 4, 5]);
        assert_eq!(hydrated.dropped[0].reason, DropReason::NotAnObject);
        assert_eq!(hydrated.dropped[1].reason, DropReason::MissingProduct);
        assert!(matches!(
            hydrated.dropped[3].reason,
            DropReason::InvalidQuantity(_)
        ));
        assert!(matches!(
            hydrated.dropped[5].reason,
            DropReason::MalformedProduct(_)
        ));
        assert_eq!(hydrated.cart.total_items(), 2);
    }

    #[test]
    fn test_duplicate_ids_merged() {
        let blob = json!([
            {"product": {"id": "A", "price": 1}, "quantity": 2},
            {"product": {"id": "A", "price": 1}, "quantity": 3}
        ])
        .to_string();

        let hydrated = decode(&blob).unwrap();
        assert_eq!(hydrated.cart.len(), 1);
        assert_eq!(hydrated.cart.total_items(), 5);
    }

    #[test]
    fn test_unreadable_blob_rejected() {
        assert!(matches!(decode("{not json"), Err(PersistError::Json(_))));
        assert!(matches!(
            decode("{\"items\": []}"),
            Err(PersistError::NotAnArray("object"))
        ));
    }

    #[test]
    fn test_empty_array() {
        let hydrated = decode("[]").unwrap();
        assert!(hydrated.cart.is_empty());
        assert!(hydrated.dropped.is_empty());
    }

    #[test]
    fn test_oversized_price_dropped() {
        let blob = r#"[
            {"product": {"id": "A", "price": "79228162514264337593543950335"}, "quantity": 2},
            {"product": {"id": "B", "price": 2}, "quantity": 1}
        ]"#;
        let hydrated = decode(blob).unwrap();

        assert_eq!(hydrated.cart.len(), 1);
        assert_eq!(hydrated.dropped.len(), 1);
        assert_eq!(hydrated.dropped[0].index, 0);
        assert_eq!(hydrated.cart.total_price(), Price::from_cents(200));
    }

    #[test]
    fn test_largest_cart_totals_without_overflow() {
        let blob = json!([
            {"product": {"id": "A", "price": 1_000_000_000}, "quantity": u32::MAX},
            {"product": {"id": "B", "price": 1_000_000_000}, "quantity": u32::MAX}
        ])
        .to_string();
        let cart = decode(&blob).unwrap().cart;

        assert_eq!(cart.total_items(), 2 * u64::from(u32::MAX));
        assert!(cart.total_price() > Price::MAX);
    }
}
