//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Responses are JSON: `{"error": "..."}`, plus `"fields"` for validation
//! failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use shopflow_core::FieldError;
use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::records::RecordApiError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout form has invalid fields.
    #[error("Validation failed: {}", .0.len())]
    Validation(Vec<FieldError>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(fields) => Self::Validation(fields),
            CheckoutError::EmptyCart => Self::BadRequest("Cart is empty".to_string()),
            CheckoutError::Cart(e) => Self::Cart(e),
        }
    }
}

impl AppError {
    /// Whether the failure is on our side (or upstream) rather than the client's.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) | Self::Cart(CartError::InvalidQuantity(_)) => {
                false
            }
            Self::Catalog(_) | Self::Cart(_) | Self::Internal(_) => true,
            Self::Validation(_) | Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Cart(CartError::InvalidQuantity(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Catalog(CatalogError::Records(e)) | Self::Cart(CartError::Records(e)) => {
                match e {
                    RecordApiError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::BAD_GATEWAY,
                }
            }
            Self::Catalog(_) | Self::Cart(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Validation(fields) => json!({
                "error": "Please fill in all required fields",
                "fields": fields,
            }),
            Self::Catalog(CatalogError::NotFound(id)) => {
                json!({ "error": format!("Product not found: {id}") })
            }
            Self::Cart(CartError::InvalidQuantity(q)) => {
                json!({ "error": format!("Invalid quantity: {q}") })
            }
            Self::NotFound(_) | Self::BadRequest(_) => json!({ "error": self.to_string() }),
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": "External service error" }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}
