//! Integration tests for ShopFlow.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopflow-integration-tests
//! ```
//!
//! Every test drives the real router in-process through `tower::ServiceExt`,
//! so no server or network is needed. The remote backend is exercised against
//! `MemoryRecords`, and the HTTP record client against a wiremock server.
//!
//! # Test Categories
//!
//! - `catalog_api` - Listing, filters, sorting, detail and categories
//! - `cart_api` - Cart lines, merging, quantities and totals
//! - `checkout_api` - Form validation and order placement
//! - `remote_backend` - The same flows over the record API

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use shopflow_storefront::cart::{CartService, LocalCart, RemoteCart};
use shopflow_storefront::catalog::{CatalogService, RemoteCatalog, SeedCatalog};
use shopflow_storefront::config::{Backend, RecordApiConfig, StorefrontConfig};
use shopflow_storefront::records::RecordApi;
use shopflow_storefront::routes;
use shopflow_storefront::state::AppState;
use shopflow_storefront::storage::MemoryStore;
use tower::ServiceExt;

/// Tax rate used by every test app.
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Configuration with no payment delay and no Sentry.
#[must_use]
pub fn test_config(backend: Backend) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        backend,
        data_dir: PathBuf::from("unused"),
        catalog_seed: None,
        records: None,
        tax_rate: TAX_RATE,
        payment_delay: Duration::ZERO,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Record API settings pointing at `base_url`.
#[must_use]
pub fn record_api_config(base_url: &str) -> RecordApiConfig {
    RecordApiConfig {
        base_url: base_url.to_string(),
        project_id: "proj_test".to_string(),
        public_key: SecretString::from("pk_test_f8Kq2LmZ9xRv4TnW".to_string()),
    }
}

/// The storefront router plus the state behind it.
#[derive(Clone)]
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Local backend: demo catalog and an in-memory cart.
    ///
    /// # Panics
    ///
    /// Panics if the bundled demo catalog is invalid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn local() -> Self {
        let catalog = SeedCatalog::demo().expect("demo catalog is valid");
        let cart = LocalCart::new(Arc::new(MemoryStore::new()));
        Self::from_state(AppState::new(
            test_config(Backend::Local),
            CatalogService::new(Arc::new(catalog)),
            Arc::new(CartService::new(cart)),
        ))
    }

    /// Remote backend over any record API.
    #[must_use]
    pub fn remote(records: Arc<dyn RecordApi>) -> Self {
        Self::from_state(AppState::new(
            test_config(Backend::Remote),
            CatalogService::new(Arc::new(RemoteCatalog::new(Arc::clone(&records)))),
            Arc::new(CartService::new(RemoteCart::new(records))),
        ))
    }

    /// Wrap an already-built state.
    #[must_use]
    pub fn from_state(state: AppState) -> Self {
        Self {
            router: routes::app(state.clone()),
            state,
        }
    }

    /// Send a request and decode the body as JSON (or a JSON string for
    /// plain-text bodies, `null` for empty ones).
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    #[allow(clippy::expect_used)]
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    /// `GET` shorthand.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    /// `POST` shorthand.
    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// `PATCH` shorthand.
    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    /// `DELETE` shorthand.
    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}

/// Read a decimal serialized as a JSON string or number.
///
/// # Panics
///
/// Panics if the value is not a decimal.
#[must_use]
#[allow(clippy::expect_used)]
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

/// Product names in listing order.
#[must_use]
pub fn names(listing: &Value) -> Vec<String> {
    listing["products"]
        .as_array()
        .map(|products| {
            products
                .iter()
                .filter_map(|p| p["name"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// A checkout form that passes validation.
#[must_use]
pub fn valid_checkout() -> Value {
    serde_json::json!({
        "shipping": {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "phone": "555-0100",
            "address": "12 Analytical Way",
            "city": "London",
            "state": "LDN",
            "zipCode": "N1 9GU",
            "country": "UK"
        },
        "payment": {
            "cardNumber": "4242 4242 4242 4242",
            "expiryDate": "12/30",
            "cvv": "123",
            "nameOnCard": "Ada Lovelace"
        }
    })
}
