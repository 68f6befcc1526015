use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SecurityGroupIdentity;

/// Desired instance, as carried in a machine's `providerSpec`.
///
/// Every resource is referenced by name and resolved at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineProviderSpec {
    pub region: String,
    pub zone: String,
    pub vpc: String,
    pub resource_group: String,
    pub image: String,
    pub profile: String,
    pub primary_network_interface: NetworkInterface,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedicated_host: Option<String>,
}

impl MachineProviderSpec {
    /// The configured dedicated host; an empty name means none.
    pub fn dedicated_host(&self) -> Option<&str> {
        self.dedicated_host.as_deref().filter(|h| !h.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub subnet: String,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default, rename = "allowIPSpoofing")]
    pub allow_ip_spoofing: bool,
}

/// Identifiers resolved from a [`MachineProviderSpec`] for one creation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentifiers {
    pub resource_group_id: String,
    pub image_id: String,
    /// Profiles are referenced by name; this is the verified name.
    pub profile: String,
    pub vpc_id: String,
    pub primary_network_interface: ResolvedNetworkInterface,
    pub network_interfaces: Vec<ResolvedNetworkInterface>,
    pub dedicated_host_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNetworkInterface {
    pub subnet_id: String,
    pub security_groups: Vec<SecurityGroupIdentity>,
    pub allow_ip_spoofing: bool,
}

/// Resource types resolved by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ResourceGroup,
    Image,
    Vpc,
    Subnet,
    DedicatedHost,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "resource group",
            Self::Image => "image",
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::DedicatedHost => "dedicated host",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
