//! REST gateway to the authoritative backend.
//!
//! Tables are named after entity kinds; the primary key is `id` and write
//! conflicts resolve last-write-wins on `updated_at` server-side. The
//! gateway performs exactly one request per call — retry policy belongs to
//! the sync engine.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use finsync_core::gateway::{GatewayError, GatewayResult, RemoteGateway};
use finsync_core::models::EntityKind;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Connection settings for the backend REST API.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub access_token: String,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Resolve from `FINSYNC_API_URL` / `FINSYNC_API_TOKEN`, `None` when the
    /// endpoint is not configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("FINSYNC_API_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())?;
        let access_token = std::env::var("FINSYNC_API_TOKEN").unwrap_or_default();
        Some(Self::new(base_url, access_token))
    }
}

/// Error envelope reported by the backend.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: String,
    message: String,
}

fn transport_err(err: reqwest::Error) -> GatewayError {
    GatewayError::transport(err.to_string())
}

/// HTTP client for the backend tables.
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl RestGateway {
    pub fn new(config: RemoteConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport_err)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token,
        })
    }

    fn headers(&self) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !self.access_token.is_empty() {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.access_token))
                .map_err(|_| GatewayError::invalid_request("Invalid access token format"))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        Ok(headers)
    }

    fn table_url(&self, kind: EntityKind) -> String {
        format!("{}/rest/v1/{}", self.base_url, kind.table_name())
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    async fn error_from_response(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::log_response(status, &body);

        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
            return GatewayError::api(
                status.as_u16(),
                format!("{}: {}", error.code, error.message),
            );
        }
        GatewayError::api(status.as_u16(), format!("request failed: {}", body))
    }

    /// Parse a row-array response body.
    async fn parse_rows(response: reqwest::Response) -> GatewayResult<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.text().await.map_err(transport_err)?;
        Self::log_response(status, &body);
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(|err| {
            GatewayError::api(
                status.as_u16(),
                format!("failed to parse response: {}", err),
            )
        })
    }
}

#[async_trait]
impl RemoteGateway for RestGateway {
    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    /// POST /rest/v1/{table}?on_conflict=id
    async fn upsert_many(&self, kind: EntityKind, rows: Vec<Value>) -> GatewayResult<Vec<Value>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}?on_conflict=id", self.table_url(kind));
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .header("prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows)
            .send()
            .await
            .map_err(transport_err)?;

        Self::parse_rows(response).await
    }

    /// DELETE /rest/v1/{table}?id=eq.{id}
    async fn delete_by_id(&self, kind: EntityKind, id: &str) -> GatewayResult<()> {
        let url = format!("{}?id=eq.{}", self.table_url(kind), urlencoding::encode(id));
        let response = self
            .client
            .delete(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::error_from_response(response).await)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// GET /rest/v1/{table}?id=eq.{id}
    async fn fetch_by_id(&self, kind: EntityKind, id: &str) -> GatewayResult<Option<Value>> {
        let url = format!("{}?id=eq.{}", self.table_url(kind), urlencoding::encode(id));
        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport_err)?;

        let rows = Self::parse_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    /// GET /rest/v1/{table}?user_id=eq.{userId}
    async fn fetch_all(&self, kind: EntityKind, user_id: &str) -> GatewayResult<Vec<Value>> {
        let url = format!(
            "{}?user_id=eq.{}",
            self.table_url(kind),
            urlencoding::encode(user_id)
        );
        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport_err)?;

        Self::parse_rows(response).await
    }
}
