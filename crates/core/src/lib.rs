//! Sanital Core - Shared types library.
//!
//! This crate provides the types used across all Sanital components:
//! - `storefront` - JSON storefront API in front of the catalog/orders backend
//! - `cli` - Command-line tools for the local cart and catalog import
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs and prices, catalog products, roles
//! - [`cart`] - The cart model and its persistence codec

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartItem};
pub use types::*;
