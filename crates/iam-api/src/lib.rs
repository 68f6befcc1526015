//! IBM Cloud IAM API-key authenticator.
//!
//! Exchanges an API key for a bearer token at `/identity/token` and keeps the
//! token cached until most of its lifetime has elapsed.

mod types;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

pub use types::*;

pub const DEFAULT_URL: &str = "https://iam.cloud.ibm.com";

const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("iam request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("iam {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("iam api key is empty")]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Authenticator for the IAM token service.
///
/// Clones share the same token cache.
#[derive(Clone)]
pub struct IamAuthenticator {
    api_key: String,
    url: String,
    http: reqwest::Client,
    cached: Arc<Mutex<Option<IamToken>>>,
}

impl IamAuthenticator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, DEFAULT_URL)
    }

    pub fn with_url(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    /// Perform a token exchange, bypassing the cache.
    pub async fn request_token(&self) -> Result<IamToken> {
        if self.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }

        let resp = self
            .http
            .post(format!("{}/identity/token", self.url))
            .header("Accept", "application/json")
            .form(&[("grant_type", GRANT_TYPE), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        Self::check(resp, "token exchange")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    /// Return a valid access token, exchanging the API key again if the
    /// cached one is due for refresh.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = chrono::Utc::now().timestamp();

        if let Some(token) = cached.as_ref().filter(|t| !t.needs_refresh(now)) {
            return Ok(token.access_token.clone());
        }

        let token = self.request_token().await?;
        debug!(expiration = token.expiration, "iam: access token refreshed");

        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// `Authorization` header value for the current token.
    pub async fn authorization(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.access_token().await?))
    }
}
