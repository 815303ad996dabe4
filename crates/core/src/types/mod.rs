//! Core types for the Sanital storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use id::*;
pub use price::{Price, PriceError};
pub use product::{CatalogRecord, Product, ProductError, ProductRef};
pub use status::*;
