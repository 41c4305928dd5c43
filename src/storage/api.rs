//! PostgREST data source
//!
//! Implements [`DataSource`] against the backend's REST data API
//! (`{base_url}/rest/v1/{table}`).
//!
//! ## Security
//!
//! Table and column names are validated before they reach the request path
//! or query string. Filter values are sent as URL-encoded query parameters.
//! The API key and access token are never logged.

use super::{DataSource, Filter, PageRange, StorageError, TableQuery, validate_identifier};
use crate::config::ClientConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Data source talking to a PostgREST endpoint
pub struct PostgrestDataSource {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl PostgrestDataSource {
    /// Create a new PostgREST data source
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL (e.g., "https://xyz.supabase.co")
    /// * `api_key` - Public API key sent as the `apikey` header
    ///
    /// # Example
    ///
    /// ```rust
    /// use filiale_report_sdk::storage::api::PostgrestDataSource;
    ///
    /// let source = PostgrestDataSource::new("https://xyz.supabase.co", "public-anon-key")
    ///     .with_access_token("user-jwt");
    /// ```
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Build from validated configuration, applying the request timeout
    pub fn from_config(config: &ClientConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                StorageError::NetworkError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            client,
        })
    }

    /// Authenticate requests as a signed-in user instead of the anonymous key
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self, table: &str) -> Result<String, StorageError> {
        validate_identifier(table)?;
        Ok(format!(
            "{}/rest/v1/{}",
            self.base_url,
            urlencoding::encode(table)
        ))
    }

    /// Build a request with the API key and bearer headers
    fn build_request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }
}

/// Quote a value inside an `in.(...)` list when it contains reserved characters
fn quote_list_value(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Query parameters for a set of filters
pub(crate) fn filter_params(filters: &[Filter]) -> Result<Vec<(String, String)>, StorageError> {
    filters
        .iter()
        .map(|filter| {
            validate_identifier(filter.column())?;
            let param = match filter {
                Filter::Eq(column, value) => (column.clone(), format!("eq.{}", value)),
                Filter::In(column, values) => {
                    let list: Vec<String> = values.iter().map(|v| quote_list_value(v)).collect();
                    (column.clone(), format!("in.({})", list.join(",")))
                }
                Filter::Gte(column, value) => (column.clone(), format!("gte.{}", value)),
                Filter::Lte(column, value) => (column.clone(), format!("lte.{}", value)),
            };
            Ok(param)
        })
        .collect()
}

/// Query parameters for a paged select
pub(crate) fn query_params(
    query: &TableQuery,
    range: PageRange,
) -> Result<Vec<(String, String)>, StorageError> {
    let mut params = vec![("select".to_string(), query.select.clone())];
    params.extend(filter_params(&query.filters)?);

    if !query.order.is_empty() {
        let mut keys = Vec::with_capacity(query.order.len());
        for key in &query.order {
            validate_identifier(&key.column)?;
            let direction = if key.descending { "desc" } else { "asc" };
            keys.push(format!("{}.{}", key.column, direction));
        }
        params.push(("order".to_string(), keys.join(",")));
    }

    params.push(("offset".to_string(), range.offset.to_string()));
    params.push(("limit".to_string(), range.limit.to_string()));
    Ok(params)
}

/// Turn a non-2xx response into a [`StorageError`], keeping the API's message
async fn error_from_response(response: reqwest::Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    match status.as_u16() {
        401 | 403 => StorageError::PermissionDenied(format!("HTTP {}: {}", status, message)),
        _ => StorageError::BackendError(format!("HTTP {}: {}", status, message)),
    }
}

#[async_trait]
impl DataSource for PostgrestDataSource {
    async fn query_page(
        &self,
        query: &TableQuery,
        range: PageRange,
    ) -> Result<Vec<Value>, StorageError> {
        let url = self.table_url(&query.table)?;
        let params = query_params(query, range)?;
        debug!(
            table = %query.table,
            offset = range.offset,
            limit = range.limit,
            "Requesting page"
        );

        let response = self
            .build_request(reqwest::Method::GET, &url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                StorageError::NetworkError(format!("Failed to query {}: {}", query.table, e))
            })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response.json::<Vec<Value>>().await.map_err(|e| {
            StorageError::SerializationError(format!("Failed to parse {} rows: {}", query.table, e))
        })
    }

    async fn insert(&self, table: &str, record: Value) -> Result<String, StorageError> {
        let url = self.table_url(table)?;
        let response = self
            .build_request(reqwest::Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| {
                StorageError::NetworkError(format!("Failed to insert into {}: {}", table, e))
            })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let rows: Vec<Value> = response.json().await.map_err(|e| {
            StorageError::SerializationError(format!("Failed to parse inserted row: {}", e))
        })?;

        rows.first()
            .and_then(|row| row.get("id"))
            .and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                StorageError::SerializationError("Inserted row has no id".to_string())
            })
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<usize, StorageError> {
        // PostgREST would patch the whole table without a filter
        if filters.is_empty() {
            return Err(StorageError::PermissionDenied(format!(
                "Refusing unfiltered update of {}",
                table
            )));
        }

        let url = self.table_url(table)?;
        let params = filter_params(filters)?;
        let response = self
            .build_request(reqwest::Method::PATCH, &url)
            .header("Prefer", "return=representation")
            .query(&params)
            .json(&patch)
            .send()
            .await
            .map_err(|e| StorageError::NetworkError(format!("Failed to update {}: {}", table, e)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let rows: Vec<Value> = response.json().await.map_err(|e| {
            StorageError::SerializationError(format!("Failed to parse updated rows: {}", e))
        })?;
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::OrderBy;

    #[test]
    fn test_query_params_encode_filters_order_and_window() {
        let query = TableQuery::new("sales")
            .filter(Filter::eq("filiale_id", "f1"))
            .filter(Filter::gte("sale_date", "2024-01-01"))
            .filter(Filter::lte("sale_date", "2024-01-31"))
            .order(OrderBy::desc("sale_date"))
            .order(OrderBy::desc("id"));
        let params = query_params(&query, PageRange::new(500, 500)).unwrap();

        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("filiale_id".to_string(), "eq.f1".to_string()),
                ("sale_date".to_string(), "gte.2024-01-01".to_string()),
                ("sale_date".to_string(), "lte.2024-01-31".to_string()),
                ("order".to_string(), "sale_date.desc,id.desc".to_string()),
                ("offset".to_string(), "500".to_string()),
                ("limit".to_string(), "500".to_string()),
            ]
        );
    }

    #[test]
    fn test_in_list_quotes_reserved_characters() {
        let params =
            filter_params(&[Filter::is_in("client_name", ["Atlas", "Dupont, SA"])]).unwrap();
        assert_eq!(params[0].1, "in.(Atlas,\"Dupont, SA\")");
    }

    #[test]
    fn test_invalid_column_rejected() {
        let query = TableQuery::new("sales").filter(Filter::eq("id;drop", "1"));
        assert!(matches!(
            query_params(&query, PageRange::new(0, 1)),
            Err(StorageError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let source = PostgrestDataSource::new("https://example.supabase.co/", "key");
        assert_eq!(
            source.table_url("sales").unwrap(),
            "https://example.supabase.co/rest/v1/sales"
        );
        assert!(source.table_url("../auth/v1/users").is_err());
    }
}
