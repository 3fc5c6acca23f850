//! Backend API client
//!
//! Queries go to `POST {base}/exec`, stored procedures to
//! `POST {base}/procedure`, both with a JSON `{"query": ...}` body and a
//! bearer token. Successful responses are JSON arrays of row objects.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use crate::domain::{rows_from, Row};
use crate::error::{RefdataError, Result};

/// Default backend base URL (the dev proxy target)
const DEFAULT_BASE_URL: &str = "http://localhost:3011/api";

/// Default API token
const DEFAULT_TOKEN: &str = "apiDG$prod";

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: DEFAULT_TOKEN.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ApiConfig {
    /// Create a config for a specific base URL, keeping the other defaults
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Result of a connectivity check, reported rather than raised
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

/// HTTP client for the reporting backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new client with the given configuration
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create a client with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(ApiConfig::default())
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Execute a query against `{base}/exec`
    pub async fn execute(&self, query: &str) -> Result<Vec<Row>> {
        self.post_query("exec", query).await
    }

    /// Execute a stored procedure against `{base}/procedure`
    pub async fn execute_procedure(&self, query: &str) -> Result<Vec<Row>> {
        self.post_query("procedure", query).await
    }

    /// Check end-to-end connectivity with a trivial query.
    ///
    /// Failures are reported in the status, not raised.
    pub async fn check_connection(&self) -> ConnectionStatus {
        match self.execute("SELECT 1 as test from dual").await {
            Ok(_) => ConnectionStatus {
                connected: true,
                message: "Connection OK".to_string(),
            },
            Err(err) => ConnectionStatus {
                connected: false,
                message: err.to_string(),
            },
        }
    }

    async fn post_query(&self, path: &str, query: &str) -> Result<Vec<Row>> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        log::debug!("POST {} query={}", url, truncate(query, 100));

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.config.token)
            .json(&json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("POST {} failed: {} {}", url, status.as_u16(), body);
            return Err(RefdataError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        // decode via text so a malformed body is a Json error, not a
        // retryable transport error
        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text)?;
        rows_from(payload)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
