//! Generic record-CRUD API used by the remote catalog and cart backends.
//!
//! # Architecture
//!
//! - Collections ("tables") hold flat JSON records addressed by a numeric `Id`
//! - Reads take a [`QueryParams`] with field projection and filter predicates
//! - [`RecordClient`] speaks HTTP to the hosted service
//! - [`MemoryRecords`] evaluates the same filter language in-process
//!
//! # Collections
//!
//! - `product` - catalog products
//! - `product_variant` - size/color/stock rows keyed by `product_id`
//! - `category` - category names
//! - `cart_item` - cart lines (remote cart backend)

mod client;
mod memory;
pub mod query;

pub use client::RecordClient;
pub use memory::MemoryRecords;
pub use query::{Combinator, Condition, FieldSelector, Operator, QueryParams, SubGroup, WhereGroup};

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

shopflow_core::define_id!(RecordId, i64);

/// Errors that can occur when talking to the record API.
#[derive(Debug, Error)]
pub enum RecordApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service reported `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A record is missing a field or has a field of the wrong type.
    #[error("Invalid record in {table}: {reason}")]
    InvalidRecord { table: String, reason: String },

    /// The configured base URL cannot address a collection.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl RecordApiError {
    /// Build an `InvalidRecord` error.
    #[must_use]
    pub fn invalid(table: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            table: table.to_owned(),
            reason: reason.into(),
        }
    }
}

/// A record returned by the API: its `Id` plus the projected fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Raw value of a field, treating JSON `null` as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// A string field. Numbers are rendered as strings.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// A boolean field. Accepts `true`/`false` and their string forms.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// An integer field. Accepts numbers, numeric strings, and reference
    /// objects of the form `{"Id": 3, "Name": "..."}`.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        value_as_i64(self.get(name)?)
    }

    /// A decimal field.
    #[must_use]
    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        value_as_decimal(self.get(name)?)
    }

    /// A list of strings. Accepts a JSON array or a comma/newline-separated
    /// string.
    #[must_use]
    pub fn string_list(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::trim))
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
            Some(Value::String(s)) => s
                .split([',', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Interpret a JSON value as a decimal number.
#[must_use]
pub fn value_as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Interpret a JSON value as an integer.
#[must_use]
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => obj.get("Id").and_then(value_as_i64),
        _ => None,
    }
}

/// CRUD access to record collections.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Fetch the records of `table` matching `params`.
    async fn query(&self, table: &str, params: &QueryParams) -> Result<Vec<Record>, RecordApiError>;

    /// Fetch one record, or `None` if no record has that ID.
    async fn get_by_id(&self, table: &str, id: RecordId) -> Result<Option<Record>, RecordApiError>;

    /// Create a record and return it with its assigned ID.
    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, RecordApiError>;

    /// Overwrite the given fields of a record and return the updated record.
    async fn update(
        &self,
        table: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<Record, RecordApiError>;

    /// Delete a record.
    async fn delete(&self, table: &str, id: RecordId) -> Result<(), RecordApiError>;
}
