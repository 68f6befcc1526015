use std::collections::BTreeSet;

use tracing::debug;

use crate::{Error, IbmCloudClient, ResourceKind, Result, SecurityGroupIdentity};

fn unresolved(kind: ResourceKind, name: &str) -> Error {
    Error::Unresolved {
        kind,
        name: name.to_string(),
    }
}

impl IbmCloudClient {
    /// Resource groups are scoped by the client's account.
    pub async fn get_resource_group_id_by_name(&self, name: &str) -> Result<String> {
        let groups = self
            .resource_manager
            .list_resource_groups(self.account.account_id(), name)
            .await?;

        let id = groups
            .into_iter()
            .next()
            .map(|group| group.id)
            .ok_or_else(|| unresolved(ResourceKind::ResourceGroup, name))?;

        debug!(name, id = %id, "ibmcloud: resolved resource group");
        Ok(id)
    }

    /// Only private (custom) images are considered.
    pub async fn get_custom_image_by_name(&self, name: &str, resource_group_id: &str) -> Result<String> {
        let images = self.vpc.list_private_images(name, resource_group_id).await?;

        let id = images
            .into_iter()
            .next()
            .map(|image| image.id)
            .ok_or_else(|| unresolved(ResourceKind::Image, name))?;

        debug!(name, id = %id, "ibmcloud: resolved image");
        Ok(id)
    }

    /// Profiles are referenced by name, so a verified profile resolves to
    /// itself.
    pub async fn verify_instance_profile(&self, profile: &str) -> Result<String> {
        let profiles = self.vpc.list_instance_profiles().await?;

        if !profiles.iter().any(|p| p.name == profile) {
            return Err(Error::InvalidMachineConfiguration(format!(
                "could not find instance profile: {profile}"
            )));
        }

        debug!(profile, "ibmcloud: verified instance profile");
        Ok(profile.to_string())
    }

    pub async fn get_vpc_id_by_name(&self, name: &str, resource_group_id: &str) -> Result<String> {
        let vpcs = self.vpc.list_vpcs(resource_group_id).await?;

        let id = vpcs
            .into_iter()
            .find(|vpc| vpc.name == name)
            .map(|vpc| vpc.id)
            .ok_or_else(|| unresolved(ResourceKind::Vpc, name))?;

        debug!(name, id = %id, "ibmcloud: resolved vpc");
        Ok(id)
    }

    pub async fn get_subnet_id_by_name(&self, name: &str, resource_group_id: &str) -> Result<String> {
        let subnets = self.vpc.list_subnets(resource_group_id).await?;

        let id = subnets
            .into_iter()
            .find(|subnet| subnet.name == name)
            .map(|subnet| subnet.id)
            .ok_or_else(|| unresolved(ResourceKind::Subnet, name))?;

        debug!(name, id = %id, "ibmcloud: resolved subnet");
        Ok(id)
    }

    /// Resolve all names with a single listing. Fails with the exact set of
    /// names that matched nothing.
    pub async fn get_security_groups_by_name(
        &self,
        names: &[String],
        resource_group_id: &str,
        vpc_id: &str,
    ) -> Result<Vec<SecurityGroupIdentity>> {
        let mut pending: BTreeSet<&str> = names.iter().map(String::as_str).collect();

        let groups = self
            .vpc
            .list_security_groups(resource_group_id, vpc_id)
            .await?;

        let mut resolved = Vec::with_capacity(pending.len());
        for group in groups {
            if pending.remove(group.name.as_str()) {
                resolved.push(SecurityGroupIdentity::new(group.id));
            }
        }

        if !pending.is_empty() {
            return Err(Error::UnresolvedSecurityGroups {
                missing: pending.into_iter().map(str::to_string).collect(),
            });
        }

        debug!(count = resolved.len(), vpc_id, "ibmcloud: resolved security groups");
        Ok(resolved)
    }

    pub async fn get_dedicated_host_by_name(
        &self,
        name: &str,
        resource_group_id: &str,
        zone: &str,
    ) -> Result<String> {
        let hosts = self.vpc.list_dedicated_hosts(resource_group_id, zone).await?;

        let id = hosts
            .into_iter()
            .find(|host| host.name == name)
            .map(|host| host.id)
            .ok_or_else(|| unresolved(ResourceKind::DedicatedHost, name))?;

        debug!(name, id = %id, zone, "ibmcloud: resolved dedicated host");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::fake::{self, FakeResourceManager, FakeVpc};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn security_groups(list: &[&str]) -> FakeVpc {
        FakeVpc {
            security_groups: list
                .iter()
                .map(|n| serde_json::from_value(json!({ "id": format!("sg-{n}"), "name": n })).unwrap())
                .collect(),
            ..FakeVpc::populated()
        }
    }

    #[tokio::test]
    async fn name_resolvers_return_matching_id() {
        let (client, _, rm) = fake::client(FakeVpc::populated(), FakeResourceManager::populated());

        assert_eq!(client.get_resource_group_id_by_name("rg1").await.unwrap(), "rg-rg1");
        assert_eq!(
            *rm.queries.lock().unwrap(),
            [(fake::ACCOUNT_ID.to_string(), "rg1".to_string())]
        );
        assert_eq!(client.get_custom_image_by_name("img1", "rg-rg1").await.unwrap(), "image-img1");
        assert_eq!(client.get_vpc_id_by_name("vpc1", "rg-rg1").await.unwrap(), "vpc-vpc1");
        assert_eq!(client.get_subnet_id_by_name("sub2", "rg-rg1").await.unwrap(), "subnet-sub2");
        assert_eq!(
            client
                .get_dedicated_host_by_name("dh1", "rg-rg1", "us-south-1")
                .await
                .unwrap(),
            "dh-dh1"
        );
    }

    #[tokio::test]
    async fn name_resolvers_report_unmatched_name() {
        let (client, _, _) = fake::client(FakeVpc::populated(), FakeResourceManager::populated());

        let err = client.get_vpc_id_by_name("vpc-missing", "rg-rg1").await.unwrap_err();
        assert_eq!(err.to_string(), "could not retrieve vpc id of name: vpc-missing");

        let err = client.get_subnet_id_by_name("sub9", "rg-rg1").await.unwrap_err();
        assert_eq!(err.to_string(), "could not retrieve subnet id of name: sub9");

        let err = client.get_custom_image_by_name("img9", "rg-rg1").await.unwrap_err();
        assert_eq!(err.to_string(), "could not retrieve image id of name: img9");

        let err = client.get_resource_group_id_by_name("rg9").await.unwrap_err();
        assert_eq!(err.to_string(), "could not retrieve resource group id of name: rg9");

        let err = client
            .get_dedicated_host_by_name("dh9", "rg-rg1", "us-south-1")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "could not retrieve dedicated host id of name: dh9");
    }

    #[tokio::test]
    async fn empty_listings_are_resolution_failures() {
        let (client, _, _) = fake::client(FakeVpc::default(), FakeResourceManager::default());

        for err in [
            client.get_vpc_id_by_name("vpc1", "rg").await.unwrap_err(),
            client.get_subnet_id_by_name("sub1", "rg").await.unwrap_err(),
            client.get_custom_image_by_name("img1", "rg").await.unwrap_err(),
            client.get_resource_group_id_by_name("rg1").await.unwrap_err(),
            client.get_dedicated_host_by_name("dh1", "rg", "z").await.unwrap_err(),
        ] {
            assert!(matches!(err, Error::Unresolved { .. }), "{err}");
        }
    }

    #[tokio::test]
    async fn listings_receive_the_given_scope() {
        let (client, vpc, _) = fake::client(FakeVpc::populated(), FakeResourceManager::populated());

        client.get_subnet_id_by_name("sub1", "rg-a").await.unwrap();
        client
            .get_security_groups_by_name(&names(&["sg1"]), "rg-b", "vpc-b")
            .await
            .unwrap();
        client
            .get_dedicated_host_by_name("dh1", "rg-c", "eu-de-2")
            .await
            .unwrap();
        client.get_vpc_id_by_name("vpc1", "rg-d").await.unwrap();
        client.get_custom_image_by_name("img1", "rg-e").await.unwrap();

        assert_eq!(
            vpc.scopes(),
            [
                ("list subnets", names(&["rg-a"])),
                ("list security groups", names(&["rg-b", "vpc-b"])),
                ("list dedicated hosts", names(&["rg-c", "eu-de-2"])),
                ("list vpcs", names(&["rg-d"])),
                ("list images", names(&["rg-e"])),
            ]
        );
    }

    #[tokio::test]
    async fn name_match_is_exact() {
        let (client, _, _) = fake::client(FakeVpc::populated(), FakeResourceManager::populated());
        assert!(client.get_vpc_id_by_name("VPC1", "rg-rg1").await.is_err());
        assert!(client.get_subnet_id_by_name("sub", "rg-rg1").await.is_err());
    }

    #[tokio::test]
    async fn listing_failure_is_propagated_verbatim() {
        let mut vpc = FakeVpc::populated();
        vpc.failing.insert("list subnets");
        let (client, _, _) = fake::client(vpc, FakeResourceManager::populated());

        let err = client.get_subnet_id_by_name("sub1", "rg-rg1").await.unwrap_err();
        assert_eq!(err.to_string(), fake::upstream_error("list subnets").to_string());
    }

    #[tokio::test]
    async fn security_groups_report_exactly_the_unmatched_names() {
        let (client, _, _) = fake::client(security_groups(&["a", "c"]), FakeResourceManager::populated());

        let err = client
            .get_security_groups_by_name(&names(&["a", "b", "c"]), "rg", "vpc")
            .await
            .unwrap_err();

        match &err {
            Error::UnresolvedSecurityGroups { missing } => assert_eq!(missing, &["b"]),
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("\"b\""));
        assert!(!message.contains("\"a\""));
        assert!(!message.contains("\"c\""));
    }

    #[tokio::test]
    async fn security_groups_ignore_unrequested_groups() {
        let (client, _, _) =
            fake::client(security_groups(&["a", "b", "z"]), FakeResourceManager::populated());

        let resolved = client
            .get_security_groups_by_name(&names(&["a", "b"]), "rg", "vpc")
            .await
            .unwrap();

        let ids: HashSet<_> = resolved.into_iter().map(|sg| sg.id).collect();
        assert_eq!(ids, HashSet::from(["sg-a".to_string(), "sg-b".to_string()]));
    }

    #[tokio::test]
    async fn duplicate_security_group_names_resolve_once() {
        let (client, _, _) = fake::client(security_groups(&["a"]), FakeResourceManager::populated());

        let resolved = client
            .get_security_groups_by_name(&names(&["a", "a"]), "rg", "vpc")
            .await
            .unwrap();
        assert_eq!(resolved, [SecurityGroupIdentity::new("sg-a")]);
    }

    #[tokio::test]
    async fn security_group_listing_failure_is_propagated() {
        let mut vpc = FakeVpc::populated();
        vpc.failing.insert("list security groups");
        let (client, _, _) = fake::client(vpc, FakeResourceManager::populated());

        let err = client
            .get_security_groups_by_name(&names(&["sg1"]), "rg", "vpc")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Vpc(_)));
    }

    #[tokio::test]
    async fn profile_verification_distinguishes_failure_kinds() {
        let (client, _, _) = fake::client(FakeVpc::populated(), FakeResourceManager::populated());
        assert_eq!(client.verify_instance_profile("bx2-2x8").await.unwrap(), "bx2-2x8");

        let err = client.verify_instance_profile("zz9-1x1").await.unwrap_err();
        assert!(err.is_invalid_configuration());
        assert!(err.to_string().contains("could not find instance profile: zz9-1x1"));

        let (client, _, _) = fake::client(FakeVpc::default(), FakeResourceManager::default());
        let err = client.verify_instance_profile("bx2-2x8").await.unwrap_err();
        assert!(err.is_invalid_configuration());
        assert!(err.to_string().contains("bx2-2x8"), "{err}");

        let mut vpc = FakeVpc::populated();
        vpc.failing.insert("list instance profiles");
        let (client, _, _) = fake::client(vpc, FakeResourceManager::populated());
        let err = client.verify_instance_profile("bx2-2x8").await.unwrap_err();
        assert!(matches!(err, Error::Vpc(_)));
        assert!(!err.is_invalid_configuration());
    }
}
