use std::sync::Arc;

use async_trait::async_trait;
use iam_api::IamAuthenticator;
use resource_manager_api::ResourceManagerClient;
use tracing::{debug, info, warn};
use vpc_api::VpcClient;

use crate::service::{ResourceManagerService, VpcService};
use crate::{
    AccountContext, ClientConfig, Error, Instance, MachineClient, MachineProviderSpec, Result,
    SecurityGroupIdentity,
};

/// Authenticated client for one account and one VPC region.
///
/// Everything is fixed at construction; clones share the service handles.
#[derive(Clone)]
pub struct IbmCloudClient {
    pub(crate) account: AccountContext,
    pub(crate) vpc: Arc<dyn VpcService>,
    pub(crate) resource_manager: Arc<dyn ResourceManagerService>,
}

impl IbmCloudClient {
    /// Authenticate with an IBM Cloud API key against the public endpoints.
    pub async fn build(credential: &str, spec: &MachineProviderSpec) -> Result<Self> {
        Self::build_with_config(&ClientConfig::new(credential), spec).await
    }

    /// Exchange the API key for a token, read the account from it, and point
    /// the VPC client at the provider spec's regional endpoint.
    pub async fn build_with_config(config: &ClientConfig, spec: &MachineProviderSpec) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::MissingCredential);
        }

        let auth = IamAuthenticator::with_url(config.api_key.clone(), config.iam_url.clone());
        let token = auth.access_token().await?;
        let account = AccountContext::from_access_token(&token)?;

        let global = VpcClient::with_service_url(auth.clone(), config.vpc_url.clone())
            .version(config.vpc_api_version.clone());
        let region = global.get_region(&spec.region).await?;
        let vpc = global.at(format!("{}/v1", region.endpoint.trim_end_matches('/')));

        let resource_manager =
            ResourceManagerClient::with_service_url(auth, config.resource_manager_url.clone());

        info!(
            region = %region.name,
            service_url = %vpc.service_url(),
            "ibmcloud: client ready"
        );

        Ok(Self::from_services(
            account,
            Arc::new(vpc),
            Arc::new(resource_manager),
        ))
    }

    /// Assemble a client from already-built service handles.
    pub fn from_services(
        account: AccountContext,
        vpc: Arc<dyn VpcService>,
        resource_manager: Arc<dyn ResourceManagerService>,
    ) -> Self {
        Self {
            account,
            vpc,
            resource_manager,
        }
    }

    pub fn account(&self) -> &AccountContext {
        &self.account
    }

    pub async fn instance_get_by_id(&self, id: &str) -> Result<Instance> {
        self.vpc.get_instance(id).await.map_err(|e| {
            if e.is_not_found() {
                Error::InstanceNotFound(id.to_string())
            } else {
                Error::Vpc(e)
            }
        })
    }

    /// Names are not unique within a VPC; the first match is returned.
    pub async fn instance_get_by_name(
        &self,
        name: &str,
        spec: &MachineProviderSpec,
    ) -> Result<Option<Instance>> {
        let mut instances = self.vpc.list_instances(name, &spec.vpc).await?;

        if instances.len() > 1 {
            warn!(
                name,
                vpc = %spec.vpc,
                matches = instances.len(),
                "ibmcloud: several instances share this name, using the first"
            );
        }

        if instances.is_empty() {
            return Ok(None);
        }
        Ok(Some(instances.swap_remove(0)))
    }

    pub async fn instance_exists_by_name(&self, name: &str, spec: &MachineProviderSpec) -> Result<bool> {
        Ok(self.instance_get_by_name(name, spec).await?.is_some())
    }

    pub async fn instance_delete_by_name(&self, name: &str, spec: &MachineProviderSpec) -> Result<()> {
        let instance = self
            .instance_get_by_name(name, spec)
            .await?
            .ok_or_else(|| Error::InstanceNotFound(name.to_string()))?;

        if instance.id.is_empty() {
            return Err(Error::MissingInstanceId);
        }

        self.vpc.delete_instance(&instance.id).await?;
        info!(instance_id = %instance.id, name, "ibmcloud: instance deleted");
        Ok(())
    }

    /// Check that a profile exists by fetching it directly.
    pub async fn instance_get_profile(&self, profile: &str) -> Result<bool> {
        if profile.is_empty() {
            return Err(Error::InvalidMachineConfiguration(
                "instance profile not set".into(),
            ));
        }

        self.vpc.get_instance_profile(profile).await?;
        debug!(profile, "ibmcloud: instance profile found");
        Ok(true)
    }
}

#[async_trait]
impl MachineClient for IbmCloudClient {
    async fn instance_get_by_id(&self, id: &str) -> Result<Instance> {
        IbmCloudClient::instance_get_by_id(self, id).await
    }

    async fn instance_get_by_name(
        &self,
        name: &str,
        spec: &MachineProviderSpec,
    ) -> Result<Option<Instance>> {
        IbmCloudClient::instance_get_by_name(self, name, spec).await
    }

    async fn instance_exists_by_name(&self, name: &str, spec: &MachineProviderSpec) -> Result<bool> {
        IbmCloudClient::instance_exists_by_name(self, name, spec).await
    }

    async fn instance_delete_by_name(&self, name: &str, spec: &MachineProviderSpec) -> Result<()> {
        IbmCloudClient::instance_delete_by_name(self, name, spec).await
    }

    async fn instance_create(
        &self,
        machine_name: &str,
        spec: &MachineProviderSpec,
        user_data: &str,
    ) -> Result<Instance> {
        IbmCloudClient::instance_create(self, machine_name, spec, user_data).await
    }

    async fn instance_get_profile(&self, profile: &str) -> Result<bool> {
        IbmCloudClient::instance_get_profile(self, profile).await
    }

    fn account_id(&self) -> &str {
        self.account.account_id()
    }

    async fn get_custom_image_by_name(&self, name: &str, resource_group_id: &str) -> Result<String> {
        IbmCloudClient::get_custom_image_by_name(self, name, resource_group_id).await
    }

    async fn verify_instance_profile(&self, profile: &str) -> Result<String> {
        IbmCloudClient::verify_instance_profile(self, profile).await
    }

    async fn get_vpc_id_by_name(&self, name: &str, resource_group_id: &str) -> Result<String> {
        IbmCloudClient::get_vpc_id_by_name(self, name, resource_group_id).await
    }

    async fn get_resource_group_id_by_name(&self, name: &str) -> Result<String> {
        IbmCloudClient::get_resource_group_id_by_name(self, name).await
    }

    async fn get_subnet_id_by_name(&self, name: &str, resource_group_id: &str) -> Result<String> {
        IbmCloudClient::get_subnet_id_by_name(self, name, resource_group_id).await
    }

    async fn get_security_groups_by_name(
        &self,
        names: &[String],
        resource_group_id: &str,
        vpc_id: &str,
    ) -> Result<Vec<SecurityGroupIdentity>> {
        IbmCloudClient::get_security_groups_by_name(self, names, resource_group_id, vpc_id).await
    }

    async fn get_dedicated_host_by_name(
        &self,
        name: &str,
        resource_group_id: &str,
        zone: &str,
    ) -> Result<String> {
        IbmCloudClient::get_dedicated_host_by_name(self, name, resource_group_id, zone).await
    }
}
