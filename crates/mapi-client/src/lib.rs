//! IBM Cloud machine client.
//!
//! Translates the names in a machine's provider spec (resource group, image,
//! profile, VPC, subnets, security groups, dedicated host) into the
//! identifiers the VPC API needs, and provisions instances from them.

mod account;
pub mod client;
pub mod config;
mod provision;
mod resolve;
pub mod service;
pub mod types;

#[cfg(test)]
mod fake;

use std::sync::Arc;

use async_trait::async_trait;

pub use account::AccountContext;
pub use client::IbmCloudClient;
pub use config::ClientConfig;
pub use provision::instance_prototype;
pub use types::{
    MachineProviderSpec, NetworkInterface, ResolvedIdentifiers, ResolvedNetworkInterface,
    ResourceKind,
};
pub use vpc_api::{IdReference as SecurityGroupIdentity, Instance, InstancePrototype};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Iam(#[from] iam_api::Error),

    #[error(transparent)]
    Vpc(#[from] vpc_api::Error),

    #[error(transparent)]
    ResourceManager(#[from] resource_manager_api::Error),

    #[error("ibm cloud credential is empty")]
    MissingCredential,

    #[error("could not parse account id from token")]
    MissingAccountId,

    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    #[error("could not get the instance id")]
    MissingInstanceId,

    #[error("could not retrieve {kind} id of name: {name}")]
    Unresolved { kind: ResourceKind, name: String },

    #[error("could not retrieve security group ids of names: {missing:?}")]
    UnresolvedSecurityGroups { missing: Vec<String> },

    #[error("invalid machine configuration: {0}")]
    InvalidMachineConfiguration(String),

    #[error("missing env var: {0}")]
    MissingEnv(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::InstanceNotFound(_))
    }

    /// Errors caused by the machine's own configuration rather than by the
    /// cloud. Retrying without changing the provider spec will not help.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidMachineConfiguration(_)
                | Self::Unresolved { .. }
                | Self::UnresolvedSecurityGroups { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Operations the machine controller performs against IBM Cloud.
///
/// [`IbmCloudClient`] is the production implementation.
#[async_trait]
pub trait MachineClient: Send + Sync + 'static {
    /// Fetch an instance by its provider ID.
    async fn instance_get_by_id(&self, id: &str) -> Result<Instance>;

    /// First instance with this name in the provider spec's VPC, if any.
    async fn instance_get_by_name(
        &self,
        name: &str,
        spec: &MachineProviderSpec,
    ) -> Result<Option<Instance>>;

    async fn instance_exists_by_name(&self, name: &str, spec: &MachineProviderSpec) -> Result<bool>;

    async fn instance_delete_by_name(&self, name: &str, spec: &MachineProviderSpec) -> Result<()>;

    /// Resolve every name in the provider spec and create the instance.
    async fn instance_create(
        &self,
        machine_name: &str,
        spec: &MachineProviderSpec,
        user_data: &str,
    ) -> Result<Instance>;

    async fn instance_get_profile(&self, profile: &str) -> Result<bool>;

    fn account_id(&self) -> &str;

    async fn get_custom_image_by_name(&self, name: &str, resource_group_id: &str) -> Result<String>;

    async fn verify_instance_profile(&self, profile: &str) -> Result<String>;

    async fn get_vpc_id_by_name(&self, name: &str, resource_group_id: &str) -> Result<String>;

    async fn get_resource_group_id_by_name(&self, name: &str) -> Result<String>;

    async fn get_subnet_id_by_name(&self, name: &str, resource_group_id: &str) -> Result<String>;

    async fn get_security_groups_by_name(
        &self,
        names: &[String],
        resource_group_id: &str,
        vpc_id: &str,
    ) -> Result<Vec<SecurityGroupIdentity>>;

    async fn get_dedicated_host_by_name(
        &self,
        name: &str,
        resource_group_id: &str,
        zone: &str,
    ) -> Result<String>;
}

/// Build an authenticated client for the provider spec's region using the public
/// IBM Cloud endpoints.
pub async fn build_client(
    credential: &str,
    spec: &MachineProviderSpec,
) -> Result<Arc<dyn MachineClient>> {
    let client = IbmCloudClient::build(credential, spec).await?;
    Ok(Arc::new(client))
}
