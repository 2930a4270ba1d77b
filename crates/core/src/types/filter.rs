//! Catalog filters and sort policies.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::category_key;
use super::product::Product;

/// Options recognized by catalog queries.
///
/// All supplied filters combine with AND. The search text matches name,
/// description or category (OR across the three). A `None` or `false`
/// option imposes no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFilters {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: bool,
    pub featured: bool,
}

impl ProductFilters {
    /// Filters matching products whose text fields contain `query`.
    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: Some(query.into()),
            ..Self::default()
        }
    }

    /// Filters matching only featured products.
    #[must_use]
    pub fn featured() -> Self {
        Self {
            featured: true,
            ..Self::default()
        }
    }

    /// Filters matching one category.
    #[must_use]
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            category: Some(name.into()),
            ..Self::default()
        }
    }

    /// The search text, ignoring blank input.
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// The category name, ignoring blank input.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether a product satisfies every supplied filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_search(product)
            && self
                .category_name()
                .is_none_or(|c| category_key(&product.category) == category_key(c))
            && self.min_price.is_none_or(|min| product.price.amount() >= min)
            && self.max_price.is_none_or(|max| product.price.amount() <= max)
            && (!self.in_stock || product.in_stock)
            && (!self.featured || product.featured)
    }

    /// Case-insensitive substring match over name, description and category.
    #[must_use]
    pub fn matches_search(&self, product: &Product) -> bool {
        let Some(query) = self.search_text() else {
            return true;
        };
        let needle = query.to_lowercase();
        [&product.name, &product.description, &product.category]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Error returned when a sort name is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sort order: {0}")]
pub struct UnknownSortOrder(pub String);

/// Caller-side ordering of a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Featured products first; otherwise the source order is kept.
    #[default]
    Featured,
    /// Ascending price.
    #[serde(rename = "price-low")]
    PriceLowToHigh,
    /// Descending price.
    #[serde(rename = "price-high")]
    PriceHighToLow,
    /// Alphabetical by name.
    Name,
}

impl SortOrder {
    /// The name used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLowToHigh => "price-low",
            Self::PriceHighToLow => "price-high",
            Self::Name => "name",
        }
    }

    /// Sort products in place. The sort is stable, so ties keep source order.
    pub fn apply(self, products: &mut [Product]) {
        products.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Featured => b.featured.cmp(&a.featured),
            Self::PriceLowToHigh => a.price.cmp(&b.price),
            Self::PriceHighToLow => b.price.cmp(&a.price),
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "featured" | "" => Ok(Self::Featured),
            "price-low" => Ok(Self::PriceLowToHigh),
            "price-high" => Ok(Self::PriceHighToLow),
            "name" => Ok(Self::Name),
            other => Err(UnknownSortOrder(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::id::ProductId;
    use crate::types::price::Price;

    fn product(id: i32, name: &str, category: &str, cents: u32, featured: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Price::from_cents(cents),
            images: vec![format!("{id}.png")],
            category: category.to_string(),
            description: format!("{name} description"),
            in_stock: id % 2 == 1,
            featured,
            variants: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Smartphone X", "electronics", 69_900, true),
            product(2, "Laptop", "Electronics", 129_900, false),
            product(3, "Desk Lamp", "home", 2_500, true),
        ]
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.get()).collect()
    }

    fn filtered(filters: &ProductFilters) -> Vec<i32> {
        let matched: Vec<Product> = catalog().into_iter().filter(|p| filters.matches(p)).collect();
        ids(&matched)
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert_eq!(filtered(&ProductFilters::default()), vec![1, 2, 3]);
    }

    #[test]
    fn test_category_is_case_insensitive_exact() {
        assert_eq!(filtered(&ProductFilters::category("electronics")), vec![1, 2]);
        assert_eq!(filtered(&ProductFilters::category("ELECTRONICS")), vec![1, 2]);
        assert!(filtered(&ProductFilters::category("electro")).is_empty());
    }

    #[test]
    fn test_search_covers_name_description_and_category() {
        assert_eq!(filtered(&ProductFilters::search("PHONE")), vec![1]);
        assert_eq!(filtered(&ProductFilters::search("lamp description")), vec![3]);
        assert_eq!(filtered(&ProductFilters::search("Home")), vec![3]);
        assert_eq!(filtered(&ProductFilters::search("   ")), vec![1, 2, 3]);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let filters = ProductFilters {
            min_price: Some(Decimal::new(25, 0)),
            max_price: Some(Decimal::new(699, 0)),
            ..ProductFilters::default()
        };
        assert_eq!(filtered(&filters), vec![1, 3]);
    }

    #[test]
    fn test_flags_combine_with_and() {
        let filters = ProductFilters {
            in_stock: true,
            featured: true,
            category: Some("home".to_string()),
            ..ProductFilters::default()
        };
        assert_eq!(filtered(&filters), vec![3]);
        assert_eq!(filtered(&ProductFilters::featured()), vec![1, 3]);
    }

    #[test]
    fn test_sort_orders() {
        let mut products = catalog();
        SortOrder::PriceLowToHigh.apply(&mut products);
        assert_eq!(ids(&products), vec![3, 1, 2]);

        SortOrder::PriceHighToLow.apply(&mut products);
        assert_eq!(ids(&products), vec![2, 1, 3]);

        SortOrder::Name.apply(&mut products);
        assert_eq!(ids(&products), vec![3, 2, 1]);
    }

    #[test]
    fn test_featured_first_is_stable() {
        let mut products = catalog();
        SortOrder::Featured.apply(&mut products);
        assert_eq!(ids(&products), vec![1, 3, 2]);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("price-low".parse::<SortOrder>().unwrap(), SortOrder::PriceLowToHigh);
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::Featured);
        assert!("random".parse::<SortOrder>().is_err());

        let json = serde_json::to_string(&SortOrder::PriceHighToLow).unwrap();
        assert_eq!(json, "\"price-high\"");
    }
}
