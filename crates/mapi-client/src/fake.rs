//! In-memory stand-ins for the IBM Cloud services, recording every call.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use resource_manager_api::ResourceGroup;
use serde_json::json;
use vpc_api::{
    DedicatedHost, Image, Instance, InstanceProfile, InstancePrototype, SecurityGroup, Subnet, Vpc,
};

use crate::service::{ResourceManagerService, VpcService};
use crate::{AccountContext, IbmCloudClient, MachineProviderSpec, NetworkInterface};

pub const ACCOUNT_ID: &str = "acct-123";

fn named<T: serde::de::DeserializeOwned>(prefix: &str, name: &str) -> T {
    serde_json::from_value(json!({ "id": format!("{prefix}-{name}"), "name": name })).unwrap()
}

pub fn instance(id: &str, name: &str) -> Instance {
    serde_json::from_value(json!({ "id": id, "name": name, "status": "running" })).unwrap()
}

pub fn upstream_error(endpoint: &'static str) -> vpc_api::Error {
    vpc_api::Error::Api {
        endpoint,
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        body: "internal error".into(),
    }
}

pub fn spec() -> MachineProviderSpec {
    MachineProviderSpec {
        region: "us-south".into(),
        zone: "us-south-1".into(),
        vpc: "vpc1".into(),
        resource_group: "rg1".into(),
        image: "img1".into(),
        profile: "bx2-2x8".into(),
        primary_network_interface: NetworkInterface {
            subnet: "sub1".into(),
            security_groups: vec!["sg1".into()],
            allow_ip_spoofing: false,
        },
        network_interfaces: Vec::new(),
        dedicated_host: None,
    }
}

#[derive(Default)]
pub struct FakeVpc {
    pub instances: Vec<Instance>,
    pub profiles: Vec<InstanceProfile>,
    pub vpcs: Vec<Vpc>,
    pub subnets: Vec<Subnet>,
    pub images: Vec<Image>,
    pub security_groups: Vec<SecurityGroup>,
    pub dedicated_hosts: Vec<DedicatedHost>,
    /// Endpoints that fail with a 500.
    pub failing: HashSet<&'static str>,
    pub calls: Mutex<Vec<&'static str>>,
    /// Scope arguments of each listing, in call order.
    pub scopes: Mutex<Vec<(&'static str, Vec<String>)>>,
    pub created: Mutex<Option<InstancePrototype>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeVpc {
    /// Inventory matching [`spec`].
    pub fn populated() -> Self {
        Self {
            profiles: vec![named("p", "bx2-2x8"), named("p", "cx2-4x8")],
            vpcs: vec![named("vpc", "other"), named("vpc", "vpc1")],
            subnets: vec![named("subnet", "sub1"), named("subnet", "sub2")],
            images: vec![named("image", "img1")],
            security_groups: vec![
                named("sg", "sg1"),
                named("sg", "sg2"),
                named("sg", "default"),
            ],
            dedicated_hosts: vec![named("dh", "dh1")],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn scopes(&self) -> Vec<(&'static str, Vec<String>)> {
        self.scopes.lock().unwrap().clone()
    }

    fn scoped_call(&self, endpoint: &'static str, scope: &[&str]) -> vpc_api::Result<()> {
        self.scopes
            .lock()
            .unwrap()
            .push((endpoint, scope.iter().map(|s| s.to_string()).collect()));
        self.call(endpoint)
    }

    fn call(&self, endpoint: &'static str) -> vpc_api::Result<()> {
        self.calls.lock().unwrap().push(endpoint);
        if self.failing.contains(endpoint) {
            return Err(upstream_error(endpoint));
        }
        Ok(())
    }
}

#[async_trait]
impl VpcService for FakeVpc {
    async fn list_instances(&self, name: &str, vpc_name: &str) -> vpc_api::Result<Vec<Instance>> {
        self.scoped_call("list instances", &[vpc_name])?;
        Ok(self.instances.iter().filter(|i| i.name == name).cloned().collect())
    }

    async fn get_instance(&self, id: &str) -> vpc_api::Result<Instance> {
        self.call("get instance")?;
        self.instances
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(vpc_api::Error::Api {
                endpoint: "get instance",
                status: reqwest::StatusCode::NOT_FOUND,
                body: "instance not found".into(),
            })
    }

    async fn create_instance(&self, prototype: &InstancePrototype) -> vpc_api::Result<Instance> {
        self.call("create instance")?;
        *self.created.lock().unwrap() = Some(prototype.clone());
        Ok(instance("0717_new", &prototype.name))
    }

    async fn delete_instance(&self, id: &str) -> vpc_api::Result<()> {
        self.call("delete instance")?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn list_instance_profiles(&self) -> vpc_api::Result<Vec<InstanceProfile>> {
        self.call("list instance profiles")?;
        Ok(self.profiles.clone())
    }

    async fn get_instance_profile(&self, name: &str) -> vpc_api::Result<InstanceProfile> {
        self.call("get instance profile")?;
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or(vpc_api::Error::Api {
                endpoint: "get instance profile",
                status: reqwest::StatusCode::NOT_FOUND,
                body: "profile not found".into(),
            })
    }

    async fn list_vpcs(&self, resource_group_id: &str) -> vpc_api::Result<Vec<Vpc>> {
        self.scoped_call("list vpcs", &[resource_group_id])?;
        Ok(self.vpcs.clone())
    }

    async fn list_subnets(&self, resource_group_id: &str) -> vpc_api::Result<Vec<Subnet>> {
        self.scoped_call("list subnets", &[resource_group_id])?;
        Ok(self.subnets.clone())
    }

    async fn list_private_images(
        &self,
        name: &str,
        resource_group_id: &str,
    ) -> vpc_api::Result<Vec<Image>> {
        self.scoped_call("list images", &[resource_group_id])?;
        Ok(self.images.iter().filter(|i| i.name == name).cloned().collect())
    }

    async fn list_security_groups(
        &self,
        resource_group_id: &str,
        vpc_id: &str,
    ) -> vpc_api::Result<Vec<SecurityGroup>> {
        self.scoped_call("list security groups", &[resource_group_id, vpc_id])?;
        Ok(self.security_groups.clone())
    }

    async fn list_dedicated_hosts(
        &self,
        resource_group_id: &str,
        zone: &str,
    ) -> vpc_api::Result<Vec<DedicatedHost>> {
        self.scoped_call("list dedicated hosts", &[resource_group_id, zone])?;
        Ok(self.dedicated_hosts.clone())
    }
}

#[derive(Default)]
pub struct FakeResourceManager {
    pub groups: Vec<ResourceGroup>,
    pub failing: bool,
    pub queries: Mutex<Vec<(String, String)>>,
}

impl FakeResourceManager {
    pub fn populated() -> Self {
        Self {
            groups: vec![named("rg", "rg1"), named("rg", "rg2")],
            ..Default::default()
        }
    }
}

#[async_trait]
impl ResourceManagerService for FakeResourceManager {
    async fn list_resource_groups(
        &self,
        account_id: &str,
        name: &str,
    ) -> resource_manager_api::Result<Vec<ResourceGroup>> {
        self.queries
            .lock()
            .unwrap()
            .push((account_id.to_string(), name.to_string()));

        if self.failing {
            return Err(resource_manager_api::Error::Api {
                endpoint: "list resource groups",
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "upstream unavailable".into(),
            });
        }
        Ok(self.groups.iter().filter(|g| g.name == name).cloned().collect())
    }
}

/// A client over the given fakes; the fakes stay reachable for assertions.
pub fn client(vpc: FakeVpc, rm: FakeResourceManager) -> (IbmCloudClient, Arc<FakeVpc>, Arc<FakeResourceManager>) {
    let vpc = Arc::new(vpc);
    let rm = Arc::new(rm);
    let client = IbmCloudClient::from_services(AccountContext::new(ACCOUNT_ID), vpc.clone(), rm.clone());
    (client, vpc, rm)
}
