//! Cart route handlers.
//!
//! Mutations run on their own task so a client that disconnects mid-request
//! cannot abandon a read-modify-write halfway through.

use std::future::Future;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopflow_core::{
    CartCandidate, CartLineItem, LineItemId, OrderSummary, ProductId, VariantSelection,
    cart_item_count, cart_total,
};
use tracing::instrument;

use crate::cart::CartError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// The cart as rendered to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub item_count: u64,
    pub total: Decimal,
}

impl From<Vec<CartLineItem>> for CartView {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self {
            item_count: cart_item_count(&items),
            total: cart_total(&items),
            items,
        }
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub size: Option<String>,
    pub color: Option<String>,
}

const fn default_quantity() -> i64 {
    1
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// Run a cart mutation to completion regardless of the client.
async fn detached<F, T>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(future)
        .await
        .map_err(|e| AppError::Internal(format!("cart task failed: {e}")))?
}

fn parse_line_id(raw: &str) -> Result<LineItemId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid cart line id: {raw}")))
}

/// Show the cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<CartView>> {
    let items = state.cart().get_cart().await?;
    Ok(Json(items.into()))
}

/// Show the checkout summary for the cart.
#[instrument(skip(state))]
pub async fn summary(State(state): State<AppState>) -> Result<Json<OrderSummary>> {
    Ok(Json(state.checkout().summary().await?))
}

/// Add a product to the cart.
///
/// The line snapshots the product's current name, price and image. Without a
/// size or color the product's first variant is chosen.
#[instrument(skip(state, body), fields(product_id = %body.product_id, quantity = body.quantity))]
pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let quantity = u32::try_from(body.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(CartError::InvalidQuantity(body.quantity))?;
    let product_id = body.product_id;
    let product = state.catalog().get_by_id(product_id).await?;

    let variant = if body.size.is_none() && body.color.is_none() {
        product.default_selection()
    } else {
        VariantSelection::new(body.size.as_deref(), body.color.as_deref())
    };
    let candidate = CartCandidate::from_product(&product, variant, quantity);

    add_breadcrumb(
        "cart",
        "Add to cart",
        &[
            ("product_id", product_id.to_string()),
            ("quantity", quantity.to_string()),
        ],
    );

    let cart = state.cart().clone();
    let items = detached(async move { Ok(cart.add_to_cart(candidate).await?) }).await?;
    Ok((StatusCode::CREATED, Json(items.into())))
}

/// Set a line's quantity.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let id = parse_line_id(&id)?;
    let cart = state.cart().clone();
    let items =
        detached(async move { Ok(cart.update_quantity(id, body.quantity).await?) }).await?;
    Ok(Json(items.into()))
}

/// Remove a line.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CartView>> {
    let id = parse_line_id(&id)?;
    let cart = state.cart().clone();
    let items = detached(async move { Ok(cart.remove_from_cart(id).await?) }).await?;
    Ok(Json(items.into()))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<Json<CartView>> {
    let cart = state.cart().clone();
    let items = detached(async move { Ok(cart.clear_cart().await?) }).await?;
    Ok(Json(items.into()))
}
