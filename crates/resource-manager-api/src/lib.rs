//! Typed Rust client for the IBM Cloud Resource Manager v2 API.
//!
//! Only resource group listing is covered.

use iam_api::IamAuthenticator;
use serde::Deserialize;

pub const DEFAULT_URL: &str = "https://resource-controller.cloud.ibm.com";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("resource manager request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("resource manager {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("resource manager authentication failed: {0}")]
    Auth(#[from] iam_api::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroupList {
    #[serde(default)]
    pub resources: Vec<ResourceGroup>,
}

/// Client for the Resource Manager REST API.
#[derive(Clone)]
pub struct ResourceManagerClient {
    service_url: String,
    auth: IamAuthenticator,
    http: reqwest::Client,
}

impl ResourceManagerClient {
    pub fn new(auth: IamAuthenticator) -> Self {
        Self::with_service_url(auth, DEFAULT_URL)
    }

    pub fn with_service_url(auth: IamAuthenticator, service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into().trim_end_matches('/').to_string(),
            auth,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.service_url)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    /// List resource groups of an account, optionally filtered by name.
    pub async fn list_resource_groups(
        &self,
        account_id: &str,
        name: Option<&str>,
    ) -> Result<ResourceGroupList> {
        let mut query: Vec<(&str, &str)> = vec![("account_id", account_id)];
        if let Some(n) = name {
            query.push(("name", n));
        }

        let resp = self
            .http
            .get(self.url("/v2/resource_groups"))
            .header("Authorization", self.auth.authorization().await?)
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await?;

        Self::check(resp, "list resource groups")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }
}
