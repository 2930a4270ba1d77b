//! Core types for ShopFlow.
//!
//! This module provides type-safe wrappers for catalog, cart and checkout concepts.

pub mod cart;
pub mod category;
pub mod checkout;
pub mod filter;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{CartCandidate, CartLineItem, cart_item_count, cart_total, find_matching_line};
pub use category::{Category, category_key, slugify};
pub use checkout::{FieldError, OrderSummary, PaymentInfo, ShippingInfo};
pub use filter::{ProductFilters, SortOrder, UnknownSortOrder};
pub use id::*;
pub use price::{Price, PriceError, format_money, round_cents};
pub use product::{Product, ProductError, Variant, VariantSelection};
