//! Catalog backed by the record API.
//!
//! Products live in the `product` collection, their variants in
//! `product_variant` (joined on `product_id`) and category names in
//! `category`. Responses are cached for 5 minutes; search queries are not
//! cached.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use shopflow_core::{Category, Price, Product, ProductFilters, ProductId, Variant};
use tracing::{debug, instrument, warn};

use super::cache::{CacheKey, CacheValue};
use super::{CatalogError, CatalogSource};
use crate::records::{
    Condition, Operator, QueryParams, Record, RecordApi, RecordApiError, RecordId, WhereGroup,
};

const PRODUCT_TABLE: &str = "product";
const VARIANT_TABLE: &str = "product_variant";
const CATEGORY_TABLE: &str = "category";

const PRODUCT_FIELDS: &[&str] = &[
    "Name",
    "price",
    "images",
    "category",
    "description",
    "in_stock",
    "featured",
    "Tags",
];
const VARIANT_FIELDS: &[&str] = &["size", "color", "stock", "product_id"];
const CATEGORY_FIELDS: &[&str] = &["Name", "slug", "description"];

/// Catalog source that reads the record API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct RemoteCatalog {
    inner: Arc<RemoteCatalogInner>,
}

struct RemoteCatalogInner {
    records: Arc<dyn RecordApi>,
    cache: Cache<CacheKey, CacheValue>,
}

impl RemoteCatalog {
    /// Create a catalog over a record API.
    #[must_use]
    pub fn new(records: Arc<dyn RecordApi>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(RemoteCatalogInner { records, cache }),
        }
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// Fetch products matching `filters` without consulting the cache.
    async fn fetch_products(&self, filters: &ProductFilters) -> Result<Vec<Product>, CatalogError> {
        let records = self
            .inner
            .records
            .query(PRODUCT_TABLE, &product_query(filters))
            .await?;

        let ids: Vec<RecordId> = records.iter().map(|r| r.id).collect();
        let mut variants = self.fetch_variants(&ids).await?;

        let mut products = Vec::with_capacity(records.len());
        for record in &records {
            let product_variants = variants.remove(&record.id).unwrap_or_default();
            match product_from_record(record, product_variants) {
                // Search and category are only checked here
                Ok(product) if filters.matches(&product) => products.push(product),
                Ok(_) => {}
                Err(e) => warn!(record_id = %record.id, error = %e, "Skipping invalid product record"),
            }
        }

        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// Variants for the given products, keyed by product record ID.
    async fn fetch_variants(
        &self,
        product_ids: &[RecordId],
    ) -> Result<HashMap<RecordId, Vec<Variant>>, CatalogError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let params = QueryParams::select(VARIANT_FIELDS).group(WhereGroup::any(
            product_ids
                .iter()
                .map(|id| Condition::new("product_id", Operator::EqualTo, id.get()))
                .collect(),
        ));
        let records = self.inner.records.query(VARIANT_TABLE, &params).await?;

        let mut by_product: HashMap<RecordId, Vec<Variant>> = HashMap::new();
        for record in &records {
            let Some(product_id) = record.integer("product_id") else {
                warn!(record_id = %record.id, "Variant without product_id");
                continue;
            };
            by_product
                .entry(RecordId::new(product_id))
                .or_default()
                .push(variant_from_record(record)?);
        }
        Ok(by_product)
    }
}

/// Build the record query for a set of filters.
///
/// Only predicates whose result does not depend on letter case are sent to
/// the backend. Search and category are text comparisons the backend may
/// perform case-sensitively, and rows it drops cannot be recovered locally,
/// so those two are evaluated by [`ProductFilters::matches`] after fetching.
fn product_query(filters: &ProductFilters) -> QueryParams {
    let mut params = QueryParams::select(PRODUCT_FIELDS);

    if let Some(min) = filters.min_price {
        params = params.filter(Condition::new(
            "price",
            Operator::GreaterThanOrEqualTo,
            min.to_string(),
        ));
    }
    if let Some(max) = filters.max_price {
        params = params.filter(Condition::new(
            "price",
            Operator::LessThanOrEqualTo,
            max.to_string(),
        ));
    }
    if filters.in_stock {
        params = params.filter(Condition::new("in_stock", Operator::EqualTo, true));
    }
    if filters.featured {
        params = params.filter(Condition::new("featured", Operator::EqualTo, true));
    }
    params
}

/// A text field that may also be a reference object `{"Id": .., "Name": ..}`.
fn text_or_reference(record: &Record, name: &str) -> Option<String> {
    match record.get(name)? {
        Value::Object(obj) => obj.get("Name").and_then(Value::as_str).map(str::to_owned),
        _ => record.string(name),
    }
}

fn product_from_record(record: &Record, variants: Vec<Variant>) -> Result<Product, CatalogError> {
    let id = i32::try_from(record.id.get())
        .map_err(|_| RecordApiError::invalid(PRODUCT_TABLE, format!("Id {} out of range", record.id)))?;
    let name = record
        .string("Name")
        .ok_or_else(|| RecordApiError::invalid(PRODUCT_TABLE, format!("record {id} has no Name")))?;
    let amount = record
        .decimal("price")
        .ok_or_else(|| RecordApiError::invalid(PRODUCT_TABLE, format!("record {id} has no price")))?;
    let price = Price::try_new(amount)
        .map_err(|e| RecordApiError::invalid(PRODUCT_TABLE, format!("record {id}: {e}")))?;

    let product = Product {
        id: ProductId::new(id),
        name,
        price,
        images: record.string_list("images"),
        category: text_or_reference(record, "category").unwrap_or_default(),
        description: record.string("description").unwrap_or_default(),
        in_stock: record.bool("in_stock").unwrap_or(false),
        featured: record.bool("featured").unwrap_or(false),
        variants,
        tags: record.string_list("Tags"),
    };
    product.validate()?;
    Ok(product)
}

fn variant_from_record(record: &Record) -> Result<Variant, CatalogError> {
    let stock = record.integer("stock").unwrap_or(0);
    let stock = u32::try_from(stock).map_err(|_| {
        RecordApiError::invalid(
            VARIANT_TABLE,
            format!("record {} has invalid stock {stock}", record.id),
        )
    })?;
    Ok(Variant {
        size: record.string("size").filter(|s| !s.trim().is_empty()),
        color: record.string("color").filter(|s| !s.trim().is_empty()),
        stock,
    })
}

#[async_trait]
impl CatalogSource for RemoteCatalog {
    #[instrument(skip(self))]
    async fn products(&self, filters: &ProductFilters) -> Result<Vec<Product>, CatalogError> {
        let cacheable = filters.search_text().is_none();
        let key = CacheKey::Products(filters.clone());

        if cacheable && let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = self.fetch_products(filters).await?;

        if cacheable {
            self.inner
                .cache
                .insert(key, CacheValue::Products(products.clone()))
                .await;
        }
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let record_id = RecordId::new(i64::from(id.get()));
        let Some(record) = self
            .inner
            .records
            .get_by_id(PRODUCT_TABLE, record_id)
            .await?
        else {
            return Ok(None);
        };

        let variants = self
            .fetch_variants(&[record_id])
            .await?
            .remove(&record_id)
            .unwrap_or_default();
        let product = product_from_record(&record, variants)?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(Some(product))
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let records = self
            .inner
            .records
            .query(CATEGORY_TABLE, &QueryParams::select(CATEGORY_FIELDS))
            .await?;

        let categories = if records.is_empty() {
            // No category rows: derive them from the products themselves
            let products = self.products(&ProductFilters::default()).await?;
            Category::tally(&products)
        } else {
            let mut categories = Vec::with_capacity(records.len());
            for record in &records {
                let Some(name) = record.string("Name").filter(|n| !n.trim().is_empty()) else {
                    warn!(record_id = %record.id, "Skipping category without a name");
                    continue;
                };
                let count = self
                    .products(&ProductFilters::category(name.clone()))
                    .await?
                    .len();
                categories.push(Category::new(name.trim(), count));
            }
            categories
        };

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::{Map, json};

    use super::*;
    use crate::records::MemoryRecords;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn seeded() -> (MemoryRecords, RecordId) {
        let records = MemoryRecords::new();
        let phone = records
            .seed(
                PRODUCT_TABLE,
                fields(json!({
                    "Name": "Smart Phone", "price": 599, "images": "a.png,b.png",
                    "category": "Electronics", "description": "A phone",
                    "in_stock": true, "featured": true, "Tags": "mobile"
                })),
            )
            .unwrap();
        records
            .seed(
                PRODUCT_TABLE,
                fields(json!({
                    "Name": "Headphones", "price": "89.99", "images": ["h.png"],
                    "category": {"Id": 7, "Name": "Electronics"}, "in_stock": true
                })),
            )
            .unwrap();
        records
            .seed(
                PRODUCT_TABLE,
                fields(json!({
                    "Name": "Mug", "price": 12, "images": ["m.png"],
                    "category": "Kitchen", "in_stock": false
                })),
            )
            .unwrap();
        records
            .seed(
                PRODUCT_TABLE,
                fields(json!({ "Name": "Broken", "price": 5, "category": "Kitchen" })),
            )
            .unwrap();
        records
            .seed(
                VARIANT_TABLE,
                fields(json!({"size": "128GB", "color": "Black", "stock": 3, "product_id": phone.get()})),
            )
            .unwrap();
        records
            .seed(
                VARIANT_TABLE,
                fields(json!({"size": "256GB", "color": "Black", "stock": 0, "product_id": {"Id": phone.get()}})),
            )
            .unwrap();
        (records, phone)
    }

    #[tokio::test]
    async fn test_products_join_variants_and_skip_invalid() {
        let (records, _) = seeded();
        let catalog = RemoteCatalog::new(Arc::new(records));

        let all = catalog.products(&ProductFilters::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Smart Phone", "Headphones", "Mug"]);

        let phone = &all[0];
        assert_eq!(phone.images, vec!["a.png", "b.png"]);
        assert_eq!(phone.variants.len(), 2);
        assert_eq!(phone.tags, vec!["mobile"]);
        assert_eq!(all[1].category, "Electronics");
        assert_eq!(all[1].price.amount(), Decimal::new(8999, 2));
        assert!(all[1].variants.is_empty());
    }

    #[tokio::test]
    async fn test_filters_are_pushed_down_and_reapplied() {
        let (records, _) = seeded();
        let catalog = RemoteCatalog::new(Arc::new(records));

        let found = catalog
            .products(&ProductFilters::search("PHONE"))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let in_stock_cheap = ProductFilters {
            in_stock: true,
            max_price: Some(Decimal::new(100, 0)),
            ..ProductFilters::default()
        };
        let found = catalog.products(&in_stock_cheap).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Headphones");
    }

    #[tokio::test]
    async fn test_product_by_id_and_cache() {
        let (records, phone) = seeded();
        let catalog = RemoteCatalog::new(Arc::new(records.clone()));
        let id = ProductId::new(i32::try_from(phone.get()).unwrap());

        let product = catalog.product(id).await.unwrap().unwrap();
        assert_eq!(product.name, "Smart Phone");
        assert!(catalog.product(ProductId::new(999)).await.unwrap().is_none());

        // Served from cache while the backend is down
        records.set_unavailable(true);
        assert!(catalog.product(id).await.unwrap().is_some());
        catalog.invalidate_all().await;
        assert!(catalog.product(id).await.is_err());
    }

    #[tokio::test]
    async fn test_categories_from_collection_and_fallback() {
        let (records, _) = seeded();
        let catalog = RemoteCatalog::new(Arc::new(records.clone()));

        // No category rows yet: derived from products
        let derived = catalog.categories().await.unwrap();
        assert_eq!(derived, vec![Category::new("Electronics", 2), Category::new("Kitchen", 1)]);

        records
            .seed(CATEGORY_TABLE, fields(json!({"Name": "Electronics", "slug": "ignored"})))
            .unwrap();
        records
            .seed(CATEGORY_TABLE, fields(json!({"Name": "Garden"})))
            .unwrap();
        catalog.invalidate_all().await;

        let listed = catalog.categories().await.unwrap();
        assert_eq!(listed, vec![Category::new("Electronics", 2), Category::new("Garden", 0)]);
    }

    #[test]
    fn test_product_query_shape() {
        let filters = ProductFilters {
            search: Some("lamp".to_string()),
            category: Some("Home".to_string()),
            featured: true,
            max_price: Some(Decimal::new(40, 0)),
            ..ProductFilters::default()
        };
        let params = product_query(&filters);
        assert!(params.where_groups.is_empty());
        let pushed: Vec<&str> = params
            .conditions
            .iter()
            .map(|c| c.field_name.as_str())
            .collect();
        assert_eq!(pushed, vec!["price", "featured"]);
        assert_eq!(params.field_names().count(), PRODUCT_FIELDS.len());
    }

    #[tokio::test]
    async fn test_text_filters_ignore_case_on_case_sensitive_backend() {
        // MemoryRecords compares text with exact case, like a strict backend
        let (records, _) = seeded();
        let catalog = RemoteCatalog::new(Arc::new(records));

        let electronics = catalog
            .products(&ProductFilters::category("ELECTRONICS"))
            .await
            .unwrap();
        assert_eq!(electronics.len(), 2);

        let found = catalog
            .products(&ProductFilters::search("smart phone"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Smart Phone");
    }
}
