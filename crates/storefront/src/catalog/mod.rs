//! Catalog query service.
//!
//! # Architecture
//!
//! - [`CatalogSource`] is the read-only product store seam
//! - [`SeedCatalog`] filters a static product list in-process
//! - [`RemoteCatalog`] queries the record API, cached via `moka` (5 minute TTL)
//! - [`CatalogService`] is what handlers call; it never mutates products
//!
//! Sorting is not a catalog concern: callers apply a
//! [`SortOrder`](shopflow_core::SortOrder) to the returned list.

mod cache;
mod remote;
mod seed;

pub use remote::RemoteCatalog;
pub use seed::SeedCatalog;

use std::sync::Arc;

use async_trait::async_trait;
use shopflow_core::{Category, Product, ProductError, ProductFilters, ProductId};
use thiserror::Error;
use tracing::instrument;

use crate::records::RecordApiError;

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product has the requested ID.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The record API failed.
    #[error("Record API error: {0}")]
    Records(#[from] RecordApiError),

    /// A product failed validation at the storage boundary.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),

    /// The seed file could not be read.
    #[error("Failed to read seed file {path}: {source}")]
    SeedIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The seed file is not a JSON product list.
    #[error("Invalid seed data: {0}")]
    SeedFormat(#[from] serde_json::Error),

    /// Two products in the seed share an ID.
    #[error("Duplicate product ID in seed data: {0}")]
    DuplicateId(ProductId),
}

/// A read-only store of products.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Products satisfying every supplied filter, in catalog order.
    async fn products(&self, filters: &ProductFilters) -> Result<Vec<Product>, CatalogError>;

    /// One product, or `None` if the ID is unknown.
    async fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;

    /// Distinct categories with product counts.
    async fn categories(&self) -> Result<Vec<Category>, CatalogError>;
}

/// Filters and looks up catalog products.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
}

impl CatalogService {
    /// Create a service over a catalog source.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    /// All products satisfying `filters`. Empty filters return every product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the source fails.
    #[instrument(skip(self))]
    pub async fn get_all(&self, filters: &ProductFilters) -> Result<Vec<Product>, CatalogError> {
        self.source.products(filters).await
    }

    /// One product by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has that ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.source
            .product(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Featured products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the source fails.
    pub async fn get_featured(&self) -> Result<Vec<Product>, CatalogError> {
        self.get_all(&ProductFilters::featured()).await
    }

    /// Distinct categories with slug and product count.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the source fails.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.source.categories().await
    }

    /// Products whose name, description or category contains `query`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the source fails.
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        self.get_all(&ProductFilters::search(query)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use shopflow_core::SortOrder;

    use super::*;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(SeedCatalog::demo().unwrap()))
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_filters_return_everything() {
        let all = service().get_all(&ProductFilters::default()).await.unwrap();
        assert_eq!(all.len(), 8);
    }

    #[tokio::test]
    async fn test_category_filter_is_case_insensitive() {
        let service = service();
        let electronics = service
            .get_all(&ProductFilters::category("electronics"))
            .await
            .unwrap();
        assert_eq!(electronics.len(), 3);
        assert!(electronics.iter().all(|p| p.category == "Electronics"));
    }

    #[tokio::test]
    async fn test_search_matches_name_description_category() {
        let service = service();
        let found = service.search_products("PHONE").await.unwrap();
        assert_eq!(names(&found), vec!["Wireless Headphones", "Smart Phone X"]);

        let by_category = service.search_products("garden").await.unwrap();
        assert_eq!(by_category.len(), 2);

        let by_description = service.search_products("stoneware").await.unwrap();
        assert_eq!(names(&by_description), vec!["Ceramic Mug"]);
    }

    #[tokio::test]
    async fn test_filters_combine_with_and() {
        let filters = ProductFilters {
            category: Some("Clothing".to_string()),
            in_stock: true,
            max_price: Some(Decimal::new(50, 0)),
            ..ProductFilters::default()
        };
        let found = service().get_all(&filters).await.unwrap();
        assert_eq!(names(&found), vec!["Classic Cotton Shirt"]);
    }

    #[tokio::test]
    async fn test_featured_sorted_by_price() {
        let mut featured = service().get_featured().await.unwrap();
        assert!(featured.iter().all(|p| p.featured));
        SortOrder::PriceLowToHigh.apply(&mut featured);
        assert_eq!(
            names(&featured),
            vec![
                "Classic Cotton Shirt",
                "Garden Hose",
                "Wireless Headphones",
                "Smart Phone X"
            ]
        );
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let service = service();
        assert_eq!(
            service.get_by_id(ProductId::new(4)).await.unwrap().name,
            "Classic Cotton Shirt"
        );
        let err = service.get_by_id(ProductId::new(404)).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(id) if id == ProductId::new(404)));
    }

    #[tokio::test]
    async fn test_categories_with_counts() {
        let categories = service().get_categories().await.unwrap();
        let summary: Vec<(&str, &str, usize)> = categories
            .iter()
            .map(|c| (c.name.as_str(), c.slug.as_str(), c.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Electronics", "electronics", 3),
                ("Clothing", "clothing", 2),
                ("Home & Garden", "home-garden", 2),
                ("Sports", "sports", 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_category_counts_agree_with_category_filter() {
        let product = |id: i32, category: &str| Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: shopflow_core::Price::from_cents(1000),
            images: vec![format!("{id}.png")],
            category: category.to_string(),
            description: String::new(),
            in_stock: true,
            featured: false,
            variants: Vec::new(),
            tags: Vec::new(),
        };
        let catalog = SeedCatalog::new(vec![
            product(1, "Home & Garden"),
            product(2, "Home Garden"),
            product(3, "home & garden "),
            product(4, "Books"),
            product(5, " BOOKS"),
        ])
        .unwrap();
        let service = CatalogService::new(Arc::new(catalog));

        let categories = service.get_categories().await.unwrap();
        assert_eq!(categories.len(), 3);
        for category in &categories {
            let matching = service
                .get_all(&ProductFilters::category(category.name.clone()))
                .await
                .unwrap();
            assert_eq!(category.count, matching.len(), "{}", category.name);
        }
    }
}
