//! HTTP client for the hosted record API.
//!
//! Every response is wrapped in an envelope:
//!
//! ```json
//! { "success": true, "message": null, "data": [...] }            // reads
//! { "success": true, "results": [{ "success": true, "data": {} }] } // writes
//! ```
//!
//! A `success: false` envelope is turned into [`RecordApiError::Rejected`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};
use url::Url;

use super::{QueryParams, Record, RecordApi, RecordApiError, RecordId};
use crate::config::RecordApiConfig;

const PROJECT_HEADER: &str = "X-Project-Id";
const PUBLIC_KEY_HEADER: &str = "X-Public-Key";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
    #[serde(default)]
    results: Vec<MutationResult>,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    success: bool,
    message: Option<String>,
    data: Option<Record>,
}

/// Client for the record API.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct RecordClient {
    inner: Arc<RecordClientInner>,
}

struct RecordClientInner {
    client: reqwest::Client,
    base_url: Url,
    project_id: String,
    public_key: SecretString,
}

impl RecordClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `RecordApiError::InvalidUrl` if the base URL does not parse.
    pub fn new(config: &RecordApiConfig) -> Result<Self, RecordApiError> {
        // Url::join replaces the last path segment unless the base ends in '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self {
            inner: Arc::new(RecordClientInner {
                client: reqwest::Client::new(),
                base_url,
                project_id: config.project_id.clone(),
                public_key: config.public_key.clone(),
            }),
        })
    }

    fn url(&self, table: &str, suffix: &str) -> Result<Url, RecordApiError> {
        Ok(self
            .inner
            .base_url
            .join(&format!("tables/{table}/records{suffix}"))?)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header(PROJECT_HEADER, &self.inner.project_id)
            .header(PUBLIC_KEY_HEADER, self.inner.public_key.expose_secret())
    }

    /// Send a request and unwrap the envelope. Returns `None` on 404.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<Envelope<T>>, RecordApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(RecordApiError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Record API returned non-success status"
            );
            return Err(RecordApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse record API response"
            );
            RecordApiError::Parse(e)
        })?;

        if !envelope.success {
            return Err(RecordApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "request failed without a message".to_owned()),
            ));
        }

        Ok(Some(envelope))
    }

    /// Unwrap the first result of a create or update call.
    fn first_result(
        table: &str,
        envelope: Option<Envelope<Value>>,
    ) -> Result<Record, RecordApiError> {
        let envelope =
            envelope.ok_or_else(|| RecordApiError::invalid(table, "collection not found"))?;
        let result = envelope
            .results
            .into_iter()
            .next()
            .ok_or_else(|| RecordApiError::invalid(table, "response has no results"))?;

        if !result.success {
            return Err(RecordApiError::Rejected(
                result
                    .message
                    .unwrap_or_else(|| "record rejected without a message".to_owned()),
            ));
        }

        result
            .data
            .ok_or_else(|| RecordApiError::invalid(table, "result has no data"))
    }
}

#[async_trait]
impl RecordApi for RecordClient {
    #[instrument(skip(self, params), fields(table = %table))]
    async fn query(&self, table: &str, params: &QueryParams) -> Result<Vec<Record>, RecordApiError> {
        let url = self.url(table, "/query")?;
        let envelope = self
            .execute::<Vec<Record>>(self.request(reqwest::Method::POST, url).json(params))
            .await?;

        let records = envelope.and_then(|e| e.data).unwrap_or_default();
        debug!(count = records.len(), "Fetched records");
        Ok(records)
    }

    #[instrument(skip(self), fields(table = %table, id = %id))]
    async fn get_by_id(&self, table: &str, id: RecordId) -> Result<Option<Record>, RecordApiError> {
        let url = self.url(table, &format!("/{id}"))?;
        let envelope = self
            .execute::<Record>(self.request(reqwest::Method::GET, url))
            .await?;
        Ok(envelope.and_then(|e| e.data))
    }

    #[instrument(skip(self, fields), fields(table = %table))]
    async fn create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, RecordApiError> {
        let url = self.url(table, "")?;
        let body = json!({ "records": [fields] });
        let envelope = self
            .execute::<Value>(self.request(reqwest::Method::POST, url).json(&body))
            .await?;
        Self::first_result(table, envelope)
    }

    #[instrument(skip(self, fields), fields(table = %table, id = %id))]
    async fn update(
        &self,
        table: &str,
        id: RecordId,
        mut fields: Map<String, Value>,
    ) -> Result<Record, RecordApiError> {
        let url = self.url(table, "")?;
        fields.insert("Id".to_owned(), json!(id));
        let body = json!({ "records": [fields] });
        let envelope = self
            .execute::<Value>(self.request(reqwest::Method::PATCH, url).json(&body))
            .await?;
        Self::first_result(table, envelope)
    }

    #[instrument(skip(self), fields(table = %table, id = %id))]
    async fn delete(&self, table: &str, id: RecordId) -> Result<(), RecordApiError> {
        let url = self.url(table, "")?;
        let body = json!({ "RecordIds": [id] });
        let envelope = self
            .execute::<Value>(self.request(reqwest::Method::DELETE, url).json(&body))
            .await?;
        if envelope.is_none() {
            return Err(RecordApiError::invalid(table, "collection not found"));
        }
        Ok(())
    }
}
