//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::{CartService, LocalCart, RemoteCart};
use crate::catalog::{CatalogError, CatalogService, RemoteCatalog, SeedCatalog};
use crate::checkout::CheckoutService;
use crate::config::{Backend, StorefrontConfig};
use crate::records::{RecordApi, RecordApiError, RecordClient};
use crate::storage::FileStore;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("record API: {0}")]
    Records(#[from] RecordApiError),
    #[error("remote backend selected but the record API is not configured")]
    MissingRecordApi,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, cart and checkout services and the configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogService,
    cart: Arc<CartService>,
    checkout: CheckoutService,
}

impl AppState {
    /// Create a state from already-built services.
    #[must_use]
    pub fn new(config: StorefrontConfig, catalog: CatalogService, cart: Arc<CartService>) -> Self {
        let checkout = CheckoutService::new(Arc::clone(&cart), config.tax_rate, config.payment_delay);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                cart,
                checkout,
            }),
        }
    }

    /// Build the services the configuration selects.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the seed catalog cannot be loaded or the record
    /// API is misconfigured.
    pub async fn from_config(config: StorefrontConfig) -> Result<Self, StateError> {
        let (catalog, cart) = match config.backend {
            Backend::Local => {
                let seed = match &config.catalog_seed {
                    Some(path) => SeedCatalog::load(path).await?,
                    None => SeedCatalog::demo()?,
                };
                let store = FileStore::new(&config.data_dir);
                (
                    CatalogService::new(Arc::new(seed)),
                    CartService::new(LocalCart::new(Arc::new(store))),
                )
            }
            Backend::Remote => {
                let records_config = config
                    .records
                    .as_ref()
                    .ok_or(StateError::MissingRecordApi)?;
                let records: Arc<dyn RecordApi> = Arc::new(RecordClient::new(records_config)?);
                (
                    CatalogService::new(Arc::new(RemoteCatalog::new(Arc::clone(&records)))),
                    CartService::new(RemoteCart::new(records)),
                )
            }
        };

        tracing::info!(backend = %config.backend, "Services initialized");
        Ok(Self::new(config, catalog, Arc::new(cart)))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a shared handle to the cart service.
    #[must_use]
    pub fn cart(&self) -> &Arc<CartService> {
        &self.inner.cart
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
