//! ShopFlow Storefront library.
//!
//! Catalog queries, the shopping cart, checkout and the JSON API that serves
//! them. Exposed as a library so the CLI and the integration tests can build
//! the same services the server runs.
//!
//! # Backends
//!
//! - **Local**: a seed catalog file plus a cart persisted in a key-value store
//! - **Remote**: catalog and cart rows held by a hosted record API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod records;
pub mod routes;
pub mod state;
pub mod storage;
