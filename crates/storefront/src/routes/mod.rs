//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Health check
//!
//! # Catalog
//! GET    /api/products            - Filtered, sorted product listing
//! GET    /api/products/featured   - Featured products
//! GET    /api/products/{id}       - Product detail
//! GET    /api/categories          - Categories with product counts
//! GET    /api/search?q=           - Text search
//!
//! # Cart
//! GET    /api/cart                - Line items with total and count
//! GET    /api/cart/summary        - Subtotal, tax, shipping and total
//! POST   /api/cart/items          - Add a product to the cart
//! PATCH  /api/cart/items/{id}     - Set a line's quantity (<= 0 removes)
//! DELETE /api/cart/items/{id}     - Remove a line
//! DELETE /api/cart                - Empty the cart
//!
//! # Checkout
//! POST   /api/checkout            - Validate, simulate payment, confirm
//! ```

pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::field::Empty;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/featured", get(products::featured))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(products::categories))
        .route("/search", get(products::search))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/summary", get(cart::summary))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::place_order))
}

/// Build the application router with tracing, request IDs and CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = Empty,
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
