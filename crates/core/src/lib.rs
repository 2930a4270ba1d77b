//! ShopFlow Core - Shared catalog and cart types.
//!
//! This crate provides the types used across all ShopFlow components:
//! - `storefront` - Catalog and cart services plus the JSON API
//! - `cli` - Command-line access to the catalog and the local cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. The cart merge rule and totals live here so every
//! backend applies them the same way.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, products, cart lines, filters, categories and
//!   checkout forms

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
