//! HTTP client for the record API.
//!
//! Thin collaborator: one GET per query, bearer-authenticated against the
//! record API via a client-credentials token fetched at connect time. The
//! discovery endpoint needs no auth. `reqwest::Client` is cheaply cloneable
//! and safe for concurrent use, so one client serves all category tasks.

use crate::error::PathGenError;
use crate::render::{PathSynthesizer, SIERRA_API_ROUTE};
use crate::resolve::{Endpoint, RecordApi, RecordPage, RecordQuery};
use async_trait::async_trait;
use base64::Engine;

/// Key/secret pair for the record API token endpoint.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    /// Client key
    pub key: String,
    /// Client secret
    pub secret: String,
}

/// Live record API client.
#[derive(Debug, Clone)]
pub struct HttpRecordApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRecordApi {
    /// Connect to the record API at `base_url`.
    ///
    /// When credentials are given, a bearer token is fetched up front;
    /// without them only unauthenticated (discovery) queries will work.
    pub async fn connect(
        base_url: &str,
        credentials: Option<&ApiCredentials>,
    ) -> Result<Self, PathGenError> {
        let http = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let token = match credentials {
            Some(creds) => Some(fetch_token(&http, &base_url, creds).await?),
            None => None,
        };

        Ok(Self {
            http,
            base_url,
            token,
        })
    }
}

async fn fetch_token(
    http: &reqwest::Client,
    base_url: &str,
    credentials: &ApiCredentials,
) -> Result<String, PathGenError> {
    let url = format!("{base_url}{SIERRA_API_ROUTE}/token");
    let basic = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", credentials.key, credentials.secret));

    let response = http
        .post(&url)
        .header(reqwest::header::AUTHORIZATION, format!("Basic {basic}"))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| PathGenError::ExternalQuery(format!("token request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PathGenError::ExternalQuery(format!(
            "token request returned {status}"
        )));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| PathGenError::ExternalQuery(format!("invalid token response: {e}")))?;

    body.get("access_token")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            PathGenError::ExternalQuery("token response missing access_token".to_string())
        })
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    async fn fetch_page(&self, query: &RecordQuery) -> Result<RecordPage, PathGenError> {
        let url = format!("{}{}", self.base_url, PathSynthesizer.query_path(query));

        let mut request = self.http.get(&url);
        if query.endpoint == Endpoint::Sierra {
            let token = self.token.as_ref().ok_or_else(|| {
                PathGenError::Configuration(
                    "record API credentials are required for this mix".to_string(),
                )
            })?;
            request = request.bearer_auth(token);
        }

        tracing::debug!("Fetching {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| PathGenError::ExternalQuery(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PathGenError::ExternalQuery(format!(
                "{url} returned {status}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PathGenError::ExternalQuery(format!("invalid JSON from {url}: {e}")))?;

        Ok(RecordPage::from_json(&body))
    }
}
