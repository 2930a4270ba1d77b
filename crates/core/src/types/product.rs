//! Catalog product types.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Errors found when validating a product record at the storage boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// The product has no name.
    #[error("product {0} has an empty name")]
    EmptyName(ProductId),
    /// The product has no images.
    #[error("product {0} has no images")]
    NoImages(ProductId),
}

/// A purchasable configuration of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub stock: u32,
}

impl Variant {
    /// The selection that identifies this variant in a cart line.
    #[must_use]
    pub fn selection(&self) -> VariantSelection {
        VariantSelection {
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }
}

/// A `{size, color}` pair captured when an item is added to the cart.
///
/// This is a snapshot, not a reference into the product's variant list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSelection {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl VariantSelection {
    /// Create a selection from optional size and color.
    #[must_use]
    pub fn new(size: Option<&str>, color: Option<&str>) -> Self {
        Self {
            size: size.map(str::to_owned),
            color: color.map(str::to_owned),
        }
    }

    /// Whether a variant matches this selection exactly.
    #[must_use]
    pub fn matches(&self, variant: &Variant) -> bool {
        self.size == variant.size && self.color == variant.color
    }
}

/// A catalog product.
///
/// Products are created by seed data or the upstream catalog and are never
/// mutated by the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub images: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Product {
    /// Check the invariants a product must satisfy to enter the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ProductError` if the name is blank or there are no images.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName(self.id));
        }
        if self.images.is_empty() {
            return Err(ProductError::NoImages(self.id));
        }
        Ok(())
    }

    /// The first image, used as the cart snapshot image.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }

    /// The product's variants, or a single implicit default variant when none
    /// are defined.
    #[must_use]
    pub fn effective_variants(&self) -> Vec<Variant> {
        if self.variants.is_empty() {
            vec![Variant {
                size: None,
                color: None,
                stock: u32::from(self.in_stock),
            }]
        } else {
            self.variants.clone()
        }
    }

    /// The variant a product page selects before the shopper chooses one.
    #[must_use]
    pub fn default_selection(&self) -> VariantSelection {
        self.variants
            .first()
            .map(Variant::selection)
            .unwrap_or_default()
    }

    /// Units available for a selection. Advisory only: the cart does not
    /// enforce it.
    #[must_use]
    pub fn variant_stock(&self, selection: &VariantSelection) -> u32 {
        self.effective_variants()
            .iter()
            .find(|v| selection.matches(v))
            .map_or(0, |v| v.stock)
    }

    /// Distinct sizes in variant order.
    #[must_use]
    pub fn available_sizes(&self) -> Vec<&str> {
        let mut sizes: Vec<&str> = Vec::new();
        for size in self.variants.iter().filter_map(|v| v.size.as_deref()) {
            if !sizes.contains(&size) {
                sizes.push(size);
            }
        }
        sizes
    }

    /// Distinct colors, limited to variants of `size` when one is chosen.
    #[must_use]
    pub fn available_colors(&self, size: Option<&str>) -> Vec<&str> {
        let mut colors: Vec<&str> = Vec::new();
        let matching = self
            .variants
            .iter()
            .filter(|v| size.is_none() || v.size.as_deref() == size);
        for color in matching.filter_map(|v| v.color.as_deref()) {
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
        colors
    }
}
