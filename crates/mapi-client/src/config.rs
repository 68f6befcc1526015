use std::env;

use crate::{Error, Result};

/// Credentials and endpoints for the IBM Cloud services the client talks to.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub iam_url: String,
    /// Global VPC endpoint used for the region lookup.
    pub vpc_url: String,
    pub resource_manager_url: String,
    pub vpc_api_version: String,
}

impl ClientConfig {
    /// Configuration for the public IBM Cloud endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            iam_url: iam_api::DEFAULT_URL.into(),
            vpc_url: vpc_api::DEFAULT_URL.into(),
            resource_manager_url: resource_manager_api::DEFAULT_URL.into(),
            vpc_api_version: vpc_api::DEFAULT_VERSION.into(),
        }
    }

    /// Create from env vars:
    ///
    /// - `IBMCLOUD_API_KEY` (required)
    /// - `IBMCLOUD_IAM_URL`
    /// - `IBMCLOUD_VPC_URL`
    /// - `IBMCLOUD_RESOURCE_MANAGER_URL`
    /// - `IBMCLOUD_VPC_API_VERSION`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("IBMCLOUD_API_KEY")
            .ok_or_else(|| Error::MissingEnv("IBMCLOUD_API_KEY".into()))?;

        let mut config = Self::new(api_key);
        if let Some(url) = lookup("IBMCLOUD_IAM_URL") {
            config.iam_url = url;
        }
        if let Some(url) = lookup("IBMCLOUD_VPC_URL") {
            config.vpc_url = url;
        }
        if let Some(url) = lookup("IBMCLOUD_RESOURCE_MANAGER_URL") {
            config.resource_manager_url = url;
        }
        if let Some(version) = lookup("IBMCLOUD_VPC_API_VERSION") {
            config.vpc_api_version = version;
        }

        Ok(config)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("iam_url", &self.iam_url)
            .field("vpc_url", &self.vpc_url)
            .field("resource_manager_url", &self.resource_manager_url)
            .field("vpc_api_version", &self.vpc_api_version)
            .finish()
    }
}
