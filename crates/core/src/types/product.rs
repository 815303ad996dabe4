//! Catalog product types.
//!
//! The backend has served products under two schemas over time: the legacy
//! one keyed by `id` with an `img` field, and the document-store one keyed by
//! `_id`. CSV imports add `image_main`/`image_sub*` columns on top. All of them
//! deserialize into [`CatalogRecord`], which is converted exactly once into the
//! canonical [`Product`]. Cart lines hold a [`ProductRef`] snapshot of it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::{ProductId, id_from_json};
use super::price::{Price, PriceError};

/// Errors that can occur when adapting a catalog record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// Neither `id` nor `_id` carries a usable identifier.
    #[error("product has no identifier")]
    MissingId,
    /// The price could not be read.
    #[error("product {id}: {source}")]
    Price {
        /// Identifier of the offending product.
        id: ProductId,
        /// Underlying price error.
        #[source]
        source: PriceError,
    },
}

/// A product record exactly as the backend (or an old persisted cart) sends it.
///
/// Every field is optional and loosely typed; use `Product::try_from` to get a
/// validated product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default, rename = "_id")]
    pub legacy_id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_main: Option<String>,
    #[serde(default)]
    pub img1: Option<String>,
    #[serde(default)]
    pub img2: Option<String>,
    #[serde(default)]
    pub img3: Option<String>,
    #[serde(default)]
    pub img4: Option<String>,
    #[serde(default)]
    pub image_sub1: Option<String>,
    #[serde(default)]
    pub image_sub2: Option<String>,
    #[serde(default, rename = "onHomepage", alias = "on_homepage")]
    pub on_homepage: Option<bool>,
}

/// A validated catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    /// Main image reference.
    pub image: Option<String>,
    /// Additional images, in display order.
    pub gallery: Vec<String>,
    pub on_homepage: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}

impl TryFrom<CatalogRecord> for Product {
    type Error = ProductError;

    fn try_from(record: CatalogRecord) -> Result<Self, Self::Error> {
        let id = id_from_json(&record.id)
            .or_else(|| id_from_json(&record.legacy_id))
            .map(ProductId::new)
            .ok_or(ProductError::MissingId)?;

        let price = Price::coerce(&record.price).map_err(|source| ProductError::Price {
            id: id.clone(),
            source,
        })?;

        let image = non_blank(record.img)
            .or_else(|| non_blank(record.image))
            .or_else(|| non_blank(record.image_main));

        let gallery = [
            record.img1,
            record.img2,
            record.img3,
            record.img4,
            record.image_sub1,
            record.image_sub2,
        ]
        .into_iter()
        .filter_map(non_blank)
        .collect();

        Ok(Self {
            id,
            name: record.name.unwrap_or_default(),
            description: record.description.unwrap_or_default(),
            price,
            category: record.category.unwrap_or_default(),
            image,
            gallery,
            on_homepage: record.on_homepage.unwrap_or(false),
        })
    }
}

/// Snapshot of the product fields a cart line needs for display and pricing.
///
/// Captured when the product is added and never re-validated against the live
/// catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: String,
    #[serde(rename = "img", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            category: product.category.clone(),
            image: product.image.clone(),
        }
    }
}

impl From<Product> for ProductRef {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            category: product.category,
            image: product.image,
        }
    }
}

impl TryFrom<CatalogRecord> for ProductRef {
    type Error = ProductError;

    fn try_from(record: CatalogRecord) -> Result<Self, Self::Error> {
        Product::try_from(record).map(Self::from)
    }
}
