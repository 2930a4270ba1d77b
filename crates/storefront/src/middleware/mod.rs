//! HTTP middleware for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. CORS
//! 3. `TraceLayer` (request span)
//! 4. Request ID (recorded into the request span)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
