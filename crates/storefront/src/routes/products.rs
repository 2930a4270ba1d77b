//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopflow_core::{Category, Product, ProductFilters, ProductId, SortOrder, VariantSelection};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub sort: Option<String>,
}

impl ProductQuery {
    fn filters(&self) -> ProductFilters {
        ProductFilters {
            search: self.search.clone(),
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: self.in_stock.unwrap_or(false),
            featured: self.featured.unwrap_or(false),
        }
    }
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub sort: Option<String>,
}

/// A sorted product listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    pub count: usize,
    pub sort: SortOrder,
    pub products: Vec<Product>,
}

impl ProductList {
    fn sorted(mut products: Vec<Product>, sort: SortOrder) -> Self {
        sort.apply(&mut products);
        Self {
            count: products.len(),
            sort,
            products,
        }
    }
}

/// A product with the choices its detail page offers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub default_selection: VariantSelection,
    pub default_stock: u32,
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        let sizes = product.available_sizes().into_iter().map(str::to_owned).collect();
        let colors = product
            .available_colors(None)
            .into_iter()
            .map(str::to_owned)
            .collect();
        let default_selection = product.default_selection();
        let default_stock = product.variant_stock(&default_selection);
        Self {
            product,
            sizes,
            colors,
            default_selection,
            default_stock,
        }
    }
}

fn parse_sort(sort: Option<&str>) -> Result<SortOrder> {
    sort.unwrap_or_default()
        .parse()
        .map_err(|e: shopflow_core::UnknownSortOrder| AppError::BadRequest(e.to_string()))
}

/// Parse a product ID path segment.
fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id: {raw}")))
}

/// List products matching the query, sorted.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductList>> {
    let sort = parse_sort(query.sort.as_deref())?;
    let products = state.catalog().get_all(&query.filters()).await?;
    Ok(Json(ProductList::sorted(products, sort)))
}

/// List featured products.
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<ProductList>> {
    let products = state.catalog().get_featured().await?;
    Ok(Json(ProductList::sorted(products, SortOrder::Featured)))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    let id = parse_product_id(&id)?;
    let product = state.catalog().get_by_id(id).await?;
    Ok(Json(product.into()))
}

/// List categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.catalog().get_categories().await?))
}

/// Search products by text.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ProductList>> {
    let sort = parse_sort(query.sort.as_deref())?;
    let products = state.catalog().search_products(&query.q).await?;
    Ok(Json(ProductList::sorted(products, sort)))
}
