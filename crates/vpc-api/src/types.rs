use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── References ──────────────────────────────────────────────────────

/// Reference to another resource by ID, as used in request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdReference {
    pub id: String,
}

impl IdReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Reference to another resource by name (zones, instance profiles).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameReference {
    pub name: String,
}

impl NameReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Reference embedded in responses (e.g. an instance's VPC).
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceReference {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub crn: Option<String>,
}

/// Pagination link: `first` / `next` in collection responses.
#[derive(Debug, Clone, Deserialize)]
pub struct PageLink {
    pub href: String,
}

impl PageLink {
    /// The `start` token carried in the link's query string.
    pub fn start(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.href).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "start")
            .map(|(_, value)| value.into_owned())
    }
}

/// Collections that may continue on a further page.
pub trait Paginated {
    type Item;

    /// Split into this page's items and the start token of the next page.
    fn into_page(self) -> (Vec<Self::Item>, Option<String>);
}

macro_rules! paginated {
    ($collection:ty, $field:ident, $item:ty) => {
        impl Paginated for $collection {
            type Item = $item;

            fn into_page(self) -> (Vec<$item>, Option<String>) {
                let next = self.next.as_ref().and_then(PageLink::start);
                (self.$field, next)
            }
        }
    };
}

// ── Regions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    pub name: String,
    /// Regional API base, without the `/v1` suffix.
    pub endpoint: String,
    #[serde(default)]
    pub status: Option<String>,
}

// ── Instances ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Deleting,
    Failed,
    Pending,
    Restarting,
    Running,
    Starting,
    Stopped,
    Stopping,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub status: Option<InstanceStatus>,
    #[serde(default)]
    pub zone: Option<NameReference>,
    #[serde(default)]
    pub vpc: Option<ResourceReference>,
    #[serde(default)]
    pub profile: Option<NameReference>,
    #[serde(default)]
    pub primary_network_interface: Option<NetworkInterfaceReference>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInterfaceReference {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_ip: Option<ReservedIpReference>,
    #[serde(default)]
    pub subnet: Option<ResourceReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservedIpReference {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceCollection {
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub next: Option<PageLink>,
}

paginated!(InstanceCollection, instances, Instance);

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceProfile {
    pub name: String,
    #[serde(default)]
    pub family: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceProfileCollection {
    pub profiles: Vec<InstanceProfile>,
}

/// Request body of `POST /instances`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstancePrototype {
    pub name: String,
    pub image: IdReference,
    pub profile: NameReference,
    pub zone: NameReference,
    pub resource_group: IdReference,
    pub primary_network_interface: NetworkInterfacePrototype,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterfacePrototype>,
    pub vpc: IdReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_target: Option<IdReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkInterfacePrototype {
    pub subnet: IdReference,
    pub security_groups: Vec<IdReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_ip_spoofing: Option<bool>,
}

// ── Network ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VpcCollection {
    pub vpcs: Vec<Vpc>,
    #[serde(default)]
    pub next: Option<PageLink>,
}

paginated!(VpcCollection, vpcs, Vpc);

#[derive(Debug, Clone, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub zone: Option<NameReference>,
    #[serde(default)]
    pub vpc: Option<ResourceReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubnetCollection {
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub next: Option<PageLink>,
}

paginated!(SubnetCollection, subnets, Subnet);

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityGroupCollection {
    pub security_groups: Vec<SecurityGroup>,
    #[serde(default)]
    pub next: Option<PageLink>,
}

paginated!(SecurityGroupCollection, security_groups, SecurityGroup);

// ── Images ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVisibility {
    Private,
    Public,
}

impl ImageVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub visibility: Option<ImageVisibility>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageCollection {
    pub images: Vec<Image>,
    #[serde(default)]
    pub next: Option<PageLink>,
}

paginated!(ImageCollection, images, Image);

// ── Dedicated hosts ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DedicatedHost {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub zone: Option<NameReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedicatedHostCollection {
    pub dedicated_hosts: Vec<DedicatedHost>,
    #[serde(default)]
    pub next: Option<PageLink>,
}

paginated!(DedicatedHostCollection, dedicated_hosts, DedicatedHost);

// ── List parameters ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ListInstancesParams {
    pub name: Option<String>,
    pub vpc_name: Option<String>,
    pub start: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListImagesParams {
    pub name: Option<String>,
    pub resource_group_id: Option<String>,
    pub visibility: Option<ImageVisibility>,
    pub start: Option<String>,
}

/// Parameters shared by the resource-group-scoped listings
/// (VPCs, subnets, security groups, dedicated hosts).
#[derive(Debug, Clone, Default)]
pub struct ListScopedParams {
    pub resource_group_id: Option<String>,
    pub vpc_id: Option<String>,
    pub zone_name: Option<String>,
    pub start: Option<String>,
}
