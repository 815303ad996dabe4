//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Login and registration against the backend
//! - `checkout` - Turning the cart into a backend order
//! - `import` - Pre-upload checks for catalog CSV files

pub mod auth;
pub mod checkout;
pub mod import;
