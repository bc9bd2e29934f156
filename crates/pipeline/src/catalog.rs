//! Open-data catalog port and the data.gov.in implementation.
//!
//! The catalog speaks the CKAN `package_search` dialect:
//! `GET {endpoint}?q=<query>&rows=<n>` answers
//! `{"success": true, "result": {"results": [...]}}`.

use crate::planner::SearchQuery;
use agriclimate_core::{AppError, AppResult, CatalogConfig};
use async_trait::async_trait;
use reqwest::header;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Placeholder for a missing title or organization.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for a missing description.
pub const NO_DESCRIPTION: &str = "No description";

/// One dataset's metadata, as returned by the catalog.
///
/// Every field is optional; accessors substitute placeholders so that a
/// sparse record can still be cited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetRecord {
    pub title: Option<String>,
    pub organization: Option<String>,
    /// The catalog's `notes` field
    pub description: Option<String>,
    /// The catalog's `name` field, the last segment of the dataset URL
    pub identifier: Option<String>,
}

impl DatasetRecord {
    /// Read a record from one element of `result.results`.
    ///
    /// Never fails: absent or oddly typed fields become `None`.
    pub fn from_value(value: &Value) -> Self {
        let text = |v: Option<&Value>| {
            v.and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            title: text(value.get("title")),
            organization: text(value.get("organization").and_then(|o| o.get("title"))),
            description: text(value.get("notes")),
            identifier: text(value.get("name")),
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn organization(&self) -> &str {
        self.organization.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }

    /// Citation URL: `url_base` followed by the identifier (empty if absent).
    pub fn url(&self, url_base: &str) -> String {
        format!("{}{}", url_base, self.identifier.as_deref().unwrap_or(""))
    }
}

/// Keyword search over dataset metadata.
#[async_trait]
pub trait DatasetCatalog: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Return at most `rows` records matching `query`, in catalog order.
    ///
    /// # Errors
    /// `AppError::Catalog` on transport failures, non-success statuses and
    /// bodies that report failure or lack a result list.
    async fn search(&self, query: &SearchQuery, rows: u32) -> AppResult<Vec<DatasetRecord>>;
}

/// Decode a `package_search` response body.
pub fn parse_search_response(body: &Value) -> AppResult<Vec<DatasetRecord>> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        let reason = body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("catalog reported failure");
        return Err(AppError::Catalog(reason.to_string()));
    }

    let results = body
        .get("result")
        .and_then(|r| r.get("results"))
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Catalog("response has no result list".to_string()))?;

    Ok(results.iter().map(DatasetRecord::from_value).collect())
}

/// data.gov.in CKAN catalog client.
pub struct DataGovCatalog {
    client: reqwest::Client,
    endpoint: String,
}

impl DataGovCatalog {
    /// Build a client from the catalog settings.
    ///
    /// # Errors
    /// Returns `AppError::Config` for a non-http endpoint, an API key that is
    /// not a valid header value, or an HTTP client build failure.
    pub fn new(config: &CatalogConfig, api_key: &str) -> AppResult<Self> {
        let endpoint = config.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Invalid catalog endpoint: {}",
                config.endpoint
            )));
        }

        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(api_key)
            .map_err(|e| AppError::Config(format!("Invalid catalog API key: {}", e)))?;
        headers.insert("api-key", key);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl DatasetCatalog for DataGovCatalog {
    fn name(&self) -> &str {
        "data.gov.in"
    }

    async fn search(&self, query: &SearchQuery, rows: u32) -> AppResult<Vec<DatasetRecord>> {
        tracing::debug!(query = %query, rows, "GET {}", self.endpoint);

        let rows = rows.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query.as_str()), ("rows", rows.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Catalog(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Catalog(format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Catalog(format!("invalid response body: {}", e)))?;

        parse_search_response(&body)
    }
}
