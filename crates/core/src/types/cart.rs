//! Cart line items and the derived totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{LineItemId, ProductId};
use super::price::Price;
use super::product::{Product, VariantSelection};

/// One entry in the cart: a product and variant combination with a quantity.
///
/// `price`, `name` and `image` are captured when the item is added and are
/// not re-synced with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub variant: VariantSelection,
    pub price: Price,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

impl CartLineItem {
    /// Build a line from a candidate and a freshly generated ID.
    #[must_use]
    pub fn from_candidate(id: LineItemId, candidate: CartCandidate) -> Self {
        Self {
            id,
            product_id: candidate.product_id,
            variant: candidate.variant,
            price: candidate.price,
            name: candidate.name,
            image: candidate.image,
            quantity: candidate.quantity,
        }
    }

    /// Whether this line holds the same `(product, size, color)` combination.
    #[must_use]
    pub fn same_combination(&self, product_id: ProductId, variant: &VariantSelection) -> bool {
        self.product_id == product_id && self.variant == *variant
    }

    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

/// An item about to be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCandidate {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub variant: VariantSelection,
    pub price: Price,
    pub name: String,
    #[serde(default)]
    pub image: String,
}

impl CartCandidate {
    /// Snapshot a catalog product for the cart.
    #[must_use]
    pub fn from_product(product: &Product, variant: VariantSelection, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            quantity,
            variant,
            price: product.price,
            name: product.name.clone(),
            image: product.primary_image().to_owned(),
        }
    }
}

/// Index of the line holding the same combination as the candidate, if any.
#[must_use]
pub fn find_matching_line(
    items: &[CartLineItem],
    product_id: ProductId,
    variant: &VariantSelection,
) -> Option<usize> {
    items
        .iter()
        .position(|item| item.same_combination(product_id, variant))
}

/// Sum of `price * quantity` over all lines. Zero for an empty cart.
#[must_use]
pub fn cart_total(items: &[CartLineItem]) -> Decimal {
    items.iter().map(CartLineItem::line_total).sum()
}

/// Total units across all lines (not distinct lines). Zero for an empty cart.
#[must_use]
pub fn cart_item_count(items: &[CartLineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}
