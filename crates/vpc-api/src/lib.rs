//! Typed Rust client for the IBM Cloud VPC API.
//!
//! Covers the subset needed to provision machines: regions, instances
//! (list, get, create, delete), instance profiles, and the name-scoped
//! listings of VPCs, subnets, images, security groups and dedicated hosts.

mod types;

use iam_api::IamAuthenticator;
use serde::de::DeserializeOwned;

pub use types::*;

/// Global endpoint, used until the regional endpoint is known.
pub const DEFAULT_URL: &str = "https://us-south.iaas.cloud.ibm.com/v1";

/// API version date sent with every request.
pub const DEFAULT_VERSION: &str = "2024-04-30";

/// Page size for list requests (the API maximum).
const PAGE_LIMIT: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vpc api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vpc api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("vpc api authentication failed: {0}")]
    Auth(#[from] iam_api::Error),

    #[error("invalid vpc service url: {0}")]
    InvalidUrl(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the VPC REST API at a single service URL.
#[derive(Clone)]
pub struct VpcClient {
    service_url: String,
    version: String,
    auth: IamAuthenticator,
    http: reqwest::Client,
}

impl VpcClient {
    pub fn new(auth: IamAuthenticator) -> Self {
        Self::with_service_url(auth, DEFAULT_URL)
    }

    pub fn with_service_url(auth: IamAuthenticator, service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into().trim_end_matches('/').to_string(),
            version: DEFAULT_VERSION.to_string(),
            auth,
            http: reqwest::Client::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Same client pointed at another service URL (e.g. a regional endpoint).
    pub fn at(&self, service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into().trim_end_matches('/').to_string(),
            ..self.clone()
        }
    }

    /// Service URL with `segments` appended, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.service_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.service_url)))?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(self.service_url.clone()))?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    async fn request(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder> {
        Ok(self
            .http
            .request(method, self.url(segments)?)
            .header("Authorization", self.auth.authorization().await?)
            .header("Accept", "application/json")
            .query(&[("version", self.version.as_str()), ("generation", "2")]))
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        endpoint: &'static str,
    ) -> Result<T> {
        let resp = self
            .request(reqwest::Method::GET, segments)
            .await?
            .query(query)
            .send()
            .await?;

        Self::check(resp, endpoint)
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    fn page_query(start: Option<&String>) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", PAGE_LIMIT.to_string())];
        if let Some(s) = start {
            query.push(("start", s.clone()));
        }
        query
    }

    // ── Regions ─────────────────────────────────────────────────────

    pub async fn get_region(&self, name: &str) -> Result<Region> {
        self.get(&["regions", name], &[], "get region").await
    }

    // ── Instances ───────────────────────────────────────────────────

    fn instances_query(params: &ListInstancesParams) -> Vec<(&'static str, String)> {
        let mut query = Self::page_query(params.start.as_ref());
        if let Some(name) = &params.name {
            query.push(("name", name.clone()));
        }
        if let Some(vpc_name) = &params.vpc_name {
            query.push(("vpc.name", vpc_name.clone()));
        }
        query
    }

    pub async fn list_instances(&self, params: &ListInstancesParams) -> Result<InstanceCollection> {
        self.get(&["instances"], &Self::instances_query(params), "list instances")
            .await
    }

    pub async fn get_instance(&self, id: &str) -> Result<Instance> {
        self.get(&["instances", id], &[], "get instance").await
    }

    pub async fn create_instance(&self, prototype: &InstancePrototype) -> Result<Instance> {
        let resp = self
            .request(reqwest::Method::POST, &["instances"])
            .await?
            .json(prototype)
            .send()
            .await?;

        Self::check(resp, "create instance")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn delete_instance(&self, id: &str) -> Result<()> {
        let resp = self
            .request(reqwest::Method::DELETE, &["instances", id])
            .await?
            .send()
            .await?;

        Self::check(resp, "delete instance").await?;
        Ok(())
    }

    // ── Instance profiles ───────────────────────────────────────────

    pub async fn list_instance_profiles(&self) -> Result<InstanceProfileCollection> {
        self.get(&["instance", "profiles"], &[], "list instance profiles")
            .await
    }

    pub async fn get_instance_profile(&self, name: &str) -> Result<InstanceProfile> {
        self.get(&["instance", "profiles", name], &[], "get instance profile")
            .await
    }

    // ── Network ─────────────────────────────────────────────────────

    fn scoped_query(params: &ListScopedParams) -> Vec<(&'static str, String)> {
        let mut query = Self::page_query(params.start.as_ref());
        if let Some(rg) = &params.resource_group_id {
            query.push(("resource_group.id", rg.clone()));
        }
        if let Some(vpc) = &params.vpc_id {
            query.push(("vpc.id", vpc.clone()));
        }
        if let Some(zone) = &params.zone_name {
            query.push(("zone.name", zone.clone()));
        }
        query
    }

    pub async fn list_vpcs(&self, params: &ListScopedParams) -> Result<VpcCollection> {
        self.get(&["vpcs"], &Self::scoped_query(params), "list vpcs").await
    }

    pub async fn list_subnets(&self, params: &ListScopedParams) -> Result<SubnetCollection> {
        self.get(&["subnets"], &Self::scoped_query(params), "list subnets")
            .await
    }

    pub async fn list_security_groups(
        &self,
        params: &ListScopedParams,
    ) -> Result<SecurityGroupCollection> {
        self.get(
            &["security_groups"],
            &Self::scoped_query(params),
            "list security groups",
        )
        .await
    }

    pub async fn list_dedicated_hosts(
        &self,
        params: &ListScopedParams,
    ) -> Result<DedicatedHostCollection> {
        self.get(
            &["dedicated_hosts"],
            &Self::scoped_query(params),
            "list dedicated hosts",
        )
        .await
    }

    // ── Images ──────────────────────────────────────────────────────

    fn images_query(params: &ListImagesParams) -> Vec<(&'static str, String)> {
        let mut query = Self::page_query(params.start.as_ref());
        if let Some(name) = &params.name {
            query.push(("name", name.clone()));
        }
        if let Some(rg) = &params.resource_group_id {
            query.push(("resource_group.id", rg.clone()));
        }
        if let Some(visibility) = params.visibility {
            query.push(("visibility", visibility.as_str().to_string()));
        }
        query
    }

    pub async fn list_images(&self, params: &ListImagesParams) -> Result<ImageCollection> {
        self.get(&["images"], &Self::images_query(params), "list images")
            .await
    }
}
