//! Category summaries derived from the catalog.

use serde::{Deserialize, Serialize};

use super::product::Product;

/// A category present in the catalog, with the number of products in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
    pub count: usize,
}

impl Category {
    /// Create a category summary, deriving the slug from the name.
    #[must_use]
    pub fn new(name: &str, count: usize) -> Self {
        Self {
            name: name.to_owned(),
            slug: slugify(name),
            count,
        }
    }

    /// Distinct categories across `products`, in first-seen order.
    ///
    /// Products are grouped by [`category_key`], the same rule the category
    /// filter matches with, so each count equals the number of products that
    /// filtering by that name returns. The first spelling seen is reported.
    #[must_use]
    pub fn tally<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<Self> {
        let mut categories: Vec<(String, Self)> = Vec::new();
        for product in products {
            let name = product.category.trim();
            if name.is_empty() {
                continue;
            }
            let key = category_key(name);
            match categories.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => existing.count += 1,
                None => categories.push((key, Self::new(name, 1))),
            }
        }
        categories.into_iter().map(|(_, category)| category).collect()
    }
}

/// The identity of a category name: trimmed and lowercased.
///
/// Two names with the same key are the same category. Slugs are coarser
/// ("Home & Garden" and "Home Garden" share one) and are display-only.
#[must_use]
pub fn category_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Lowercase a name and join its alphanumeric runs with single hyphens.
///
/// ```
/// use shopflow_core::slugify;
///
/// assert_eq!(slugify("Home & Garden"), "home-garden");
/// assert_eq!(slugify("  Electronics "), "electronics");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
