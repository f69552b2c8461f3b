//! Conversion of native records into canonical records.
//!
//! Converters denormalize: tenant ids become tenant names through the
//! identity collaborator, and same-cloud foreign keys are followed to pull
//! in the referenced resource's name where identity needs it. All lookups
//! are read-only; a reference that cannot be resolved is a `NotFound`.

use crate::cloud::IdentityApi;
use crate::error::MigrateError;
use crate::hash::seal;
use crate::Result;
use migrate_api::canonical::{
    Canonical, FloatingIpSpec, LbMemberSpec, LbMonitorSpec, LbPoolSpec, LbVipSpec, NetworkSpec,
    RouterSpec, SecurityGroupRuleSpec, SecurityGroupSpec, SubnetSpec,
};
use migrate_api::native::{
    FloatingIpData, LbMemberData, LbMonitorData, LbPoolData, LbVipData, NetworkData, PortData,
    RouterData, SecurityGroupData, SecurityGroupRuleData, SubnetData,
};

fn find_network<'a>(networks: &'a [NetworkData], id: &str) -> Result<&'a NetworkData> {
    networks
        .iter()
        .find(|n| n.id == id)
        .ok_or_else(|| MigrateError::not_found("network", id))
}

pub async fn network(
    identity: &dyn IdentityApi,
    subnets: &[SubnetData],
    net: &NetworkData,
) -> Result<Canonical<NetworkSpec>> {
    let tenant_name = identity.tenant_name_by_id(&net.tenant_id).await?;

    let mut subnet_names = Vec::with_capacity(net.subnets.len());
    for subnet_id in &net.subnets {
        let subnet = subnets
            .iter()
            .find(|s| &s.id == subnet_id)
            .ok_or_else(|| MigrateError::not_found("subnet", subnet_id.clone()))?;
        subnet_names.push(subnet.name.clone());
    }

    Ok(seal(
        net.id.clone(),
        NetworkSpec {
            name: net.name.clone(),
            admin_state_up: net.admin_state_up,
            shared: net.shared,
            tenant_name,
            subnet_names,
            external: net.external,
            physical_network: net.physical_network.clone(),
            network_type: net.network_type.clone(),
            segmentation_id: net.segmentation_id,
        },
    ))
}

pub async fn subnet(
    identity: &dyn IdentityApi,
    networks: &[NetworkData],
    snet: &SubnetData,
) -> Result<Canonical<SubnetSpec>> {
    let net = find_network(networks, &snet.network_id)?;
    let tenant_name = identity.tenant_name_by_id(&snet.tenant_id).await?;

    Ok(seal(
        snet.id.clone(),
        SubnetSpec {
            name: snet.name.clone(),
            enable_dhcp: snet.enable_dhcp,
            allocation_pools: snet.allocation_pools.clone(),
            gateway_ip: snet.gateway_ip.clone(),
            ip_version: snet.ip_version,
            cidr: snet.cidr.clone(),
            network_id: snet.network_id.clone(),
            network_name: net.name.clone(),
            external: net.external,
            tenant_name,
        },
    ))
}

pub async fn router(
    identity: &dyn IdentityApi,
    networks: &[NetworkData],
    ports: &[PortData],
    rtr: &RouterData,
) -> Result<Canonical<RouterSpec>> {
    let tenant_name = identity.tenant_name_by_id(&rtr.tenant_id).await?;

    let mut ips = Vec::new();
    let mut subnet_ids = Vec::new();
    for port in ports.iter().filter(|p| p.device_id == rtr.id) {
        for fixed_ip in &port.fixed_ips {
            ips.push(fixed_ip.ip_address.clone());
            if !subnet_ids.contains(&fixed_ip.subnet_id) {
                subnet_ids.push(fixed_ip.subnet_id.clone());
            }
        }
    }

    let mut ext_net_id = None;
    let mut ext_net_name = None;
    let mut ext_net_tenant_name = None;
    if let Some(gateway) = &rtr.external_gateway_info {
        let ext_net = find_network(networks, &gateway.network_id)?;
        ext_net_id = Some(ext_net.id.clone());
        ext_net_name = Some(ext_net.name.clone());
        ext_net_tenant_name = Some(identity.tenant_name_by_id(&ext_net.tenant_id).await?);
    }

    Ok(seal(
        rtr.id.clone(),
        RouterSpec {
            name: rtr.name.clone(),
            admin_state_up: rtr.admin_state_up,
            routes: rtr.routes.clone(),
            tenant_name,
            ips,
            subnet_ids,
            ext_net_id,
            ext_net_name,
            ext_net_tenant_name,
        },
    ))
}

pub async fn floating_ip(
    identity: &dyn IdentityApi,
    networks: &[NetworkData],
    fip: &FloatingIpData,
) -> Result<Canonical<FloatingIpSpec>> {
    let ext_net = find_network(networks, &fip.floating_network_id)?;
    let ext_net_tenant_name = identity.tenant_name_by_id(&ext_net.tenant_id).await?;
    let tenant_name = identity.tenant_name_by_id(&fip.tenant_id).await?;

    Ok(seal(
        fip.id.clone(),
        FloatingIpSpec {
            tenant_name,
            floating_network_id: fip.floating_network_id.clone(),
            network_name: ext_net.name.clone(),
            ext_net_tenant_name,
            fixed_ip_address: fip.fixed_ip_address.clone(),
            floating_ip_address: fip.floating_ip_address.clone(),
        },
    ))
}

pub fn security_group_rule(rule: &SecurityGroupRuleData) -> Canonical<SecurityGroupRuleSpec> {
    seal(
        rule.id.clone(),
        SecurityGroupRuleSpec {
            direction: rule.direction.clone(),
            remote_ip_prefix: rule.remote_ip_prefix.clone(),
            protocol: rule.protocol.clone(),
            port_range_min: rule.port_range_min,
            port_range_max: rule.port_range_max,
            ethertype: rule.ethertype.clone(),
            remote_group_id: rule.remote_group_id.clone(),
            security_group_id: rule.security_group_id.clone(),
        },
    )
}

pub async fn security_group(
    identity: &dyn IdentityApi,
    group: &SecurityGroupData,
) -> Result<Canonical<SecurityGroupSpec>> {
    let tenant_name = identity.tenant_name_by_id(&group.tenant_id).await?;
    let rules = group
        .security_group_rules
        .iter()
        .map(security_group_rule)
        .collect();

    Ok(seal(
        group.id.clone(),
        SecurityGroupSpec {
            name: group.name.clone(),
            tenant_name,
            description: group.description.clone(),
            rules,
        },
    ))
}

pub async fn lb_pool(identity: &dyn IdentityApi, pool: &LbPoolData) -> Result<Canonical<LbPoolSpec>> {
    let tenant_name = identity.tenant_name_by_id(&pool.tenant_id).await?;

    Ok(seal(
        pool.id.clone(),
        LbPoolSpec {
            name: pool.name.clone(),
            tenant_name,
            subnet_id: pool.subnet_id.clone(),
            protocol: pool.protocol.clone(),
            lb_method: pool.lb_method.clone(),
            provider: pool.provider.clone(),
            health_monitors: pool.health_monitors.clone(),
        },
    ))
}

pub async fn lb_monitor(
    identity: &dyn IdentityApi,
    monitor: &LbMonitorData,
) -> Result<Canonical<LbMonitorSpec>> {
    let tenant_name = identity.tenant_name_by_id(&monitor.tenant_id).await?;

    Ok(seal(
        monitor.id.clone(),
        LbMonitorSpec {
            tenant_name,
            monitor_type: monitor.monitor_type.clone(),
            delay: monitor.delay,
            timeout: monitor.timeout,
            max_retries: monitor.max_retries,
        },
    ))
}

pub async fn lb_member(
    identity: &dyn IdentityApi,
    member: &LbMemberData,
) -> Result<Canonical<LbMemberSpec>> {
    let tenant_name = identity.tenant_name_by_id(&member.tenant_id).await?;

    Ok(seal(
        member.id.clone(),
        LbMemberSpec {
            tenant_name,
            pool_id: member.pool_id.clone(),
            address: member.address.clone(),
            protocol_port: member.protocol_port,
            weight: member.weight,
        },
    ))
}

pub async fn lb_vip(identity: &dyn IdentityApi, vip: &LbVipData) -> Result<Canonical<LbVipSpec>> {
    let tenant_name = identity.tenant_name_by_id(&vip.tenant_id).await?;

    Ok(seal(
        vip.id.clone(),
        LbVipSpec {
            name: vip.name.clone(),
            tenant_name,
            pool_id: vip.pool_id.clone(),
            subnet_id: vip.subnet_id.clone(),
            address: vip.address.clone(),
            protocol: vip.protocol.clone(),
            protocol_port: vip.protocol_port,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{network_data, subnet_data, FakeIdentity};
    use migrate_api::native::{ExternalGatewayInfo, FixedIp};

    #[tokio::test]
    async fn test_subnet_denormalizes_network_name() {
        let identity = FakeIdentity::new(&[("t1", "admin")]);
        let networks = vec![network_data("net-1", "private", "t1", false)];
        let snet = subnet_data("sub-1", "private-sub", "net-1", "t1", "10.0.0.0/24");

        let canonical = subnet(&identity, &networks, &snet).await.unwrap();
        assert_eq!(canonical.spec.network_name, "private");
        assert_eq!(canonical.spec.tenant_name, "admin");
        assert!(!canonical.spec.external);
    }

    #[tokio::test]
    async fn test_subnet_with_missing_network_is_not_found() {
        let identity = FakeIdentity::new(&[("t1", "admin")]);
        let snet = subnet_data("sub-1", "orphan", "net-gone", "t1", "10.0.0.0/24");

        let err = subnet(&identity, &[], &snet).await.unwrap_err();
        assert!(matches!(err, MigrateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_tenant_name_invariance() {
        // Same tenant name behind different ids on the two clouds.
        let src_identity = FakeIdentity::new(&[("src-t", "ops")]);
        let dst_identity = FakeIdentity::new(&[("dst-t", "ops")]);

        let mut src_net = network_data("net-s", "shared-net", "src-t", false);
        src_net.shared = true;
        let mut dst_net = network_data("net-d", "shared-net", "dst-t", false);
        dst_net.shared = true;

        let a = network(&src_identity, &[], &src_net).await.unwrap();
        let b = network(&dst_identity, &[], &dst_net).await.unwrap();
        assert_eq!(a.identity_hash, b.identity_hash);
    }

    #[tokio::test]
    async fn test_router_collects_port_bindings() {
        let identity = FakeIdentity::new(&[("t1", "admin")]);
        let networks = vec![network_data("ext-1", "public", "t1", true)];
        let router_data = migrate_api::native::RouterData {
            id: "rtr-1".to_string(),
            name: "edge".to_string(),
            admin_state_up: true,
            routes: vec![],
            external_gateway_info: Some(ExternalGatewayInfo {
                network_id: "ext-1".to_string(),
            }),
            tenant_id: "t1".to_string(),
        };
        let ports = vec![migrate_api::native::PortData {
            id: "port-1".to_string(),
            network_id: "net-1".to_string(),
            mac_address: "fa:16:3e:00:00:01".to_string(),
            device_id: "rtr-1".to_string(),
            tenant_id: "t1".to_string(),
            fixed_ips: vec![
                FixedIp {
                    ip_address: "10.0.0.1".to_string(),
                    subnet_id: "sub-1".to_string(),
                },
                FixedIp {
                    ip_address: "10.0.1.1".to_string(),
                    subnet_id: "sub-1".to_string(),
                },
            ],
        }];

        let canonical = router(&identity, &networks, &ports, &router_data)
            .await
            .unwrap();
        assert_eq!(canonical.spec.ips, vec!["10.0.0.1", "10.0.1.1"]);
        // subnet ids are deduplicated
        assert_eq!(canonical.spec.subnet_ids, vec!["sub-1"]);
        assert_eq!(canonical.spec.ext_net_name.as_deref(), Some("public"));
    }
}
