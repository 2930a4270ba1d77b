//! Static catalog loaded from a JSON product list.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use shopflow_core::{Category, Product, ProductFilters, ProductId};
use tracing::{info, instrument};

use super::{CatalogError, CatalogSource};

const DEMO_CATALOG: &str = include_str!("../../data/products.json");

/// A fixed product list, filtered in-process.
#[derive(Debug, Clone)]
pub struct SeedCatalog {
    products: Vec<Product>,
}

impl SeedCatalog {
    /// Build a catalog from products, validating each one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a product is invalid or an ID repeats.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for product in &products {
            product.validate()?;
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
        }
        Ok(Self { products })
    }

    /// Parse a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or a product is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Load a seed file from disk.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::SeedIo {
                path: path.display().to_string(),
                source,
            })?;
        let catalog = Self::from_json(&json)?;
        info!(products = catalog.len(), "Loaded catalog seed");
        Ok(catalog)
    }

    /// The built-in demo catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled data is invalid.
    pub fn demo() -> Result<Self, CatalogError> {
        Self::from_json(DEMO_CATALOG)
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// All products in seed order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

#[async_trait]
impl CatalogSource for SeedCatalog {
    async fn products(&self, filters: &ProductFilters) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .products
            .iter()
            .filter(|p| filters.matches(p))
            .cloned()
            .collect())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(Category::tally(&self.products))
    }
}
