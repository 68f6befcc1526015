//! Seams between the resolver and the IBM Cloud APIs.
//!
//! Listing methods return every matching resource: the adapters for the real
//! clients follow `next` page links until the collection is exhausted.

use std::future::Future;

use async_trait::async_trait;
use resource_manager_api::{ResourceGroup, ResourceManagerClient};
use tracing::warn;
use vpc_api::{
    DedicatedHost, Image, ImageVisibility, Instance, InstanceProfile, InstancePrototype,
    ListImagesParams, ListInstancesParams, ListScopedParams, Paginated, SecurityGroup, Subnet,
    Vpc, VpcClient,
};

#[async_trait]
pub trait VpcService: Send + Sync + 'static {
    /// Instances named `name` in the VPC named `vpc_name`.
    async fn list_instances(&self, name: &str, vpc_name: &str) -> vpc_api::Result<Vec<Instance>>;

    async fn get_instance(&self, id: &str) -> vpc_api::Result<Instance>;

    async fn create_instance(&self, prototype: &InstancePrototype) -> vpc_api::Result<Instance>;

    async fn delete_instance(&self, id: &str) -> vpc_api::Result<()>;

    async fn list_instance_profiles(&self) -> vpc_api::Result<Vec<InstanceProfile>>;

    async fn get_instance_profile(&self, name: &str) -> vpc_api::Result<InstanceProfile>;

    async fn list_vpcs(&self, resource_group_id: &str) -> vpc_api::Result<Vec<Vpc>>;

    async fn list_subnets(&self, resource_group_id: &str) -> vpc_api::Result<Vec<Subnet>>;

    /// Private images named `name` in the resource group.
    async fn list_private_images(
        &self,
        name: &str,
        resource_group_id: &str,
    ) -> vpc_api::Result<Vec<Image>>;

    async fn list_security_groups(
        &self,
        resource_group_id: &str,
        vpc_id: &str,
    ) -> vpc_api::Result<Vec<SecurityGroup>>;

    async fn list_dedicated_hosts(
        &self,
        resource_group_id: &str,
        zone: &str,
    ) -> vpc_api::Result<Vec<DedicatedHost>>;
}

#[async_trait]
pub trait ResourceManagerService: Send + Sync + 'static {
    /// Resource groups named `name` in the account.
    async fn list_resource_groups(
        &self,
        account_id: &str,
        name: &str,
    ) -> resource_manager_api::Result<Vec<ResourceGroup>>;
}

/// Drain a paginated listing, feeding each page's start token into the next request.
/// Stops early if a page links back to the token it was fetched with.
async fn collect_pages<C, F, Fut>(mut fetch: F) -> vpc_api::Result<Vec<C::Item>>
where
    C: Paginated,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = vpc_api::Result<C>>,
{
    let mut items = Vec::new();
    let mut start: Option<String> = None;

    loop {
        let requested = start.take();
        let (page, next) = fetch(requested.clone()).await?.into_page();
        items.extend(page);

        match next {
            Some(token) if requested.as_ref() == Some(&token) => {
                warn!(start = %token, "ibmcloud: page links to itself, stopping");
                return Ok(items);
            }
            Some(token) => start = Some(token),
            None => return Ok(items),
        }
    }
}

fn scoped(resource_group_id: &str, start: Option<String>) -> ListScopedParams {
    ListScopedParams {
        resource_group_id: Some(resource_group_id.to_string()),
        start,
        ..Default::default()
    }
}

#[async_trait]
impl VpcService for VpcClient {
    async fn list_instances(&self, name: &str, vpc_name: &str) -> vpc_api::Result<Vec<Instance>> {
        collect_pages(|start| {
            let params = ListInstancesParams {
                name: Some(name.to_string()),
                vpc_name: Some(vpc_name.to_string()),
                start,
            };
            async move { VpcClient::list_instances(self, &params).await }
        })
        .await
    }

    async fn get_instance(&self, id: &str) -> vpc_api::Result<Instance> {
        VpcClient::get_instance(self, id).await
    }

    async fn create_instance(&self, prototype: &InstancePrototype) -> vpc_api::Result<Instance> {
        VpcClient::create_instance(self, prototype).await
    }

    async fn delete_instance(&self, id: &str) -> vpc_api::Result<()> {
        VpcClient::delete_instance(self, id).await
    }

    async fn list_instance_profiles(&self) -> vpc_api::Result<Vec<InstanceProfile>> {
        Ok(VpcClient::list_instance_profiles(self).await?.profiles)
    }

    async fn get_instance_profile(&self, name: &str) -> vpc_api::Result<InstanceProfile> {
        VpcClient::get_instance_profile(self, name).await
    }

    async fn list_vpcs(&self, resource_group_id: &str) -> vpc_api::Result<Vec<Vpc>> {
        collect_pages(|start| {
            let params = scoped(resource_group_id, start);
            async move { VpcClient::list_vpcs(self, &params).await }
        })
        .await
    }

    async fn list_subnets(&self, resource_group_id: &str) -> vpc_api::Result<Vec<Subnet>> {
        collect_pages(|start| {
            let params = scoped(resource_group_id, start);
            async move { VpcClient::list_subnets(self, &params).await }
        })
        .await
    }

    async fn list_private_images(
        &self,
        name: &str,
        resource_group_id: &str,
    ) -> vpc_api::Result<Vec<Image>> {
        collect_pages(|start| {
            let params = ListImagesParams {
                name: Some(name.to_string()),
                resource_group_id: Some(resource_group_id.to_string()),
                visibility: Some(ImageVisibility::Private),
                start,
            };
            async move { VpcClient::list_images(self, &params).await }
        })
        .await
    }

    async fn list_security_groups(
        &self,
        resource_group_id: &str,
        vpc_id: &str,
    ) -> vpc_api::Result<Vec<SecurityGroup>> {
        collect_pages(|start| {
            let params = ListScopedParams {
                vpc_id: Some(vpc_id.to_string()),
                ..scoped(resource_group_id, start)
            };
            async move { VpcClient::list_security_groups(self, &params).await }
        })
        .await
    }

    async fn list_dedicated_hosts(
        &self,
        resource_group_id: &str,
        zone: &str,
    ) -> vpc_api::Result<Vec<DedicatedHost>> {
        collect_pages(|start| {
            let params = ListScopedParams {
                zone_name: Some(zone.to_string()),
                ..scoped(resource_group_id, start)
            };
            async move { VpcClient::list_dedicated_hosts(self, &params).await }
        })
        .await
    }
}

#[async_trait]
impl ResourceManagerService for ResourceManagerClient {
    async fn list_resource_groups(
        &self,
        account_id: &str,
        name: &str,
    ) -> resource_manager_api::Result<Vec<ResourceGroup>> {
        Ok(ResourceManagerClient::list_resource_groups(self, account_id, Some(name))
            .await?
            .resources)
    }
}
