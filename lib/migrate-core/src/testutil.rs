//! Shared fixtures for the test modules.

use crate::cloud::IdentityApi;
use crate::error::MigrateError;
use crate::Result;
use migrate_api::native::{
    FixedIp, FloatingIpData, NetworkData, PortData, RouterData, SecurityGroupData,
    SecurityGroupRuleData, SubnetData,
};
use std::collections::HashMap;

/// Identity collaborator over a fixed tenant table.
pub struct FakeIdentity {
    by_id: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl FakeIdentity {
    pub fn new(tenants: &[(&str, &str)]) -> Self {
        let by_id = tenants
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        let by_name = tenants
            .iter()
            .map(|(id, name)| (name.to_string(), id.to_string()))
            .collect();
        Self { by_id, by_name }
    }
}

#[async_trait::async_trait]
impl IdentityApi for FakeIdentity {
    async fn tenant_id_by_name(&self, name: &str) -> Result<String> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| MigrateError::not_found("tenant", name))
    }

    async fn tenant_name_by_id(&self, id: &str) -> Result<String> {
        self.by_id
            .get(id)
            .cloned()
            .ok_or_else(|| MigrateError::not_found("tenant", id))
    }
}

pub fn network_data(id: &str, name: &str, tenant_id: &str, external: bool) -> NetworkData {
    NetworkData {
        id: id.to_string(),
        name: name.to_string(),
        admin_state_up: true,
        shared: false,
        tenant_id: tenant_id.to_string(),
        subnets: vec![],
        external,
        physical_network: external.then(|| "physnet1".to_string()),
        network_type: external.then(|| "flat".to_string()),
        segmentation_id: None,
    }
}

pub fn subnet_data(id: &str, name: &str, network_id: &str, tenant_id: &str, cidr: &str) -> SubnetData {
    SubnetData {
        id: id.to_string(),
        name: name.to_string(),
        enable_dhcp: true,
        allocation_pools: vec![],
        gateway_ip: None,
        ip_version: 4,
        cidr: cidr.to_string(),
        network_id: network_id.to_string(),
        tenant_id: tenant_id.to_string(),
    }
}

pub fn router_data(id: &str, name: &str, tenant_id: &str) -> RouterData {
    RouterData {
        id: id.to_string(),
        name: name.to_string(),
        admin_state_up: true,
        routes: vec![],
        external_gateway_info: None,
        tenant_id: tenant_id.to_string(),
    }
}

pub fn router_port(id: &str, router_id: &str, network_id: &str, subnet_id: &str, ip: &str) -> PortData {
    PortData {
        id: id.to_string(),
        network_id: network_id.to_string(),
        mac_address: format!("fa:16:3e:00:00:{:02x}", id.len() as u8),
        device_id: router_id.to_string(),
        tenant_id: "t1".to_string(),
        fixed_ips: vec![FixedIp {
            ip_address: ip.to_string(),
            subnet_id: subnet_id.to_string(),
        }],
    }
}

pub fn floating_ip_data(id: &str, tenant_id: &str, network_id: &str, address: &str) -> FloatingIpData {
    FloatingIpData {
        id: id.to_string(),
        tenant_id: tenant_id.to_string(),
        floating_network_id: network_id.to_string(),
        fixed_ip_address: None,
        floating_ip_address: address.to_string(),
    }
}

pub fn security_group_data(id: &str, name: &str, tenant_id: &str) -> SecurityGroupData {
    SecurityGroupData {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} group"),
        tenant_id: tenant_id.to_string(),
        security_group_rules: vec![],
    }
}

pub fn tcp_rule(id: &str, group_id: &str, tenant_id: &str, port: u16) -> SecurityGroupRuleData {
    SecurityGroupRuleData {
        id: id.to_string(),
        direction: "ingress".to_string(),
        remote_ip_prefix: Some("0.0.0.0/0".to_string()),
        protocol: Some("tcp".to_string()),
        port_range_min: Some(port),
        port_range_max: Some(port),
        ethertype: "IPv4".to_string(),
        remote_group_id: None,
        security_group_id: group_id.to_string(),
        tenant_id: tenant_id.to_string(),
    }
}

/// Placeholder rule the provider seeds groups with; has no protocol.
pub fn placeholder_rule(id: &str, group_id: &str, tenant_id: &str) -> SecurityGroupRuleData {
    SecurityGroupRuleData {
        id: id.to_string(),
        direction: "egress".to_string(),
        remote_ip_prefix: None,
        protocol: None,
        port_range_min: None,
        port_range_max: None,
        ethertype: "IPv4".to_string(),
        remote_group_id: None,
        security_group_id: group_id.to_string(),
        tenant_id: tenant_id.to_string(),
    }
}
