use tracing::{debug, info};
use vpc_api::{IdReference, InstancePrototype, NameReference, NetworkInterfacePrototype};

use crate::{
    IbmCloudClient, Instance, MachineProviderSpec, NetworkInterface, ResolvedIdentifiers,
    ResolvedNetworkInterface, Result,
};

impl IbmCloudClient {
    /// Resolve every name in the provider spec, in dependency order. The first failure
    /// is returned as is.
    pub async fn resolve_identifiers(&self, spec: &MachineProviderSpec) -> Result<ResolvedIdentifiers> {
        let resource_group_id = self.get_resource_group_id_by_name(&spec.resource_group).await?;
        let image_id = self.get_custom_image_by_name(&spec.image, &resource_group_id).await?;
        let profile = self.verify_instance_profile(&spec.profile).await?;
        let vpc_id = self.get_vpc_id_by_name(&spec.vpc, &resource_group_id).await?;

        let primary_network_interface = self
            .resolve_network_interface(&spec.primary_network_interface, &resource_group_id, &vpc_id)
            .await?;

        let mut network_interfaces = Vec::with_capacity(spec.network_interfaces.len());
        for interface in &spec.network_interfaces {
            network_interfaces.push(
                self.resolve_network_interface(interface, &resource_group_id, &vpc_id)
                    .await?,
            );
        }

        let dedicated_host_id = match spec.dedicated_host() {
            Some(host) => Some(
                self.get_dedicated_host_by_name(host, &resource_group_id, &spec.zone)
                    .await?,
            ),
            None => None,
        };

        Ok(ResolvedIdentifiers {
            resource_group_id,
            image_id,
            profile,
            vpc_id,
            primary_network_interface,
            network_interfaces,
            dedicated_host_id,
        })
    }

    async fn resolve_network_interface(
        &self,
        interface: &NetworkInterface,
        resource_group_id: &str,
        vpc_id: &str,
    ) -> Result<ResolvedNetworkInterface> {
        let subnet_id = self
            .get_subnet_id_by_name(&interface.subnet, resource_group_id)
            .await?;
        let security_groups = self
            .get_security_groups_by_name(&interface.security_groups, resource_group_id, vpc_id)
            .await?;

        Ok(ResolvedNetworkInterface {
            subnet_id,
            security_groups,
            allow_ip_spoofing: interface.allow_ip_spoofing,
        })
    }

    /// Resolve the provider spec and create the instance in a single call.
    pub async fn instance_create(
        &self,
        machine_name: &str,
        spec: &MachineProviderSpec,
        user_data: &str,
    ) -> Result<Instance> {
        let resolved = self.resolve_identifiers(spec).await?;
        debug!(machine_name, ?resolved, "ibmcloud: resolved machine spec");

        let prototype = instance_prototype(machine_name, spec, &resolved, user_data);
        let instance = self.vpc.create_instance(&prototype).await?;

        info!(
            instance_id = %instance.id,
            name = %instance.name,
            zone = %spec.zone,
            "ibmcloud: instance created"
        );
        Ok(instance)
    }
}

fn network_interface_prototype(interface: &ResolvedNetworkInterface) -> NetworkInterfacePrototype {
    NetworkInterfacePrototype {
        subnet: IdReference::new(&interface.subnet_id),
        security_groups: interface.security_groups.clone(),
        allow_ip_spoofing: Some(interface.allow_ip_spoofing),
    }
}

/// Assemble the `POST /instances` body from resolved identifiers.
///
/// The profile and zone are referenced by name, everything else by ID. The
/// spoofing flag is sent for the primary interface as well as the secondary
/// ones.
pub fn instance_prototype(
    machine_name: &str,
    spec: &MachineProviderSpec,
    resolved: &ResolvedIdentifiers,
    user_data: &str,
) -> InstancePrototype {
    InstancePrototype {
        name: machine_name.to_string(),
        image: IdReference::new(&resolved.image_id),
        profile: NameReference::new(&resolved.profile),
        zone: NameReference::new(&spec.zone),
        resource_group: IdReference::new(&resolved.resource_group_id),
        primary_network_interface: network_interface_prototype(&resolved.primary_network_interface),
        network_interfaces: resolved
            .network_interfaces
            .iter()
            .map(network_interface_prototype)
            .collect(),
        vpc: IdReference::new(&resolved.vpc_id),
        user_data: Some(user_data.to_string()).filter(|d| !d.is_empty()),
        placement_target: resolved.dedicated_host_id.as_deref().map(IdReference::new),
    }
}
