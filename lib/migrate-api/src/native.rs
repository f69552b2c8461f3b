//! Native resource records as returned by a cloud's network control plane.
//!
//! Field names follow the provider's wire attributes so exports of a live
//! cloud deserialize directly. Ids in these records are only meaningful
//! within the cloud that produced them.

use serde::{Deserialize, Serialize};

/// A layer-2 network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkData {
    pub id: String,
    pub name: String,
    pub admin_state_up: bool,
    pub shared: bool,
    pub tenant_id: String,
    /// Ids of subnets carved out of this network
    #[serde(default)]
    pub subnets: Vec<String>,
    /// Whether this network fronts the outside world
    #[serde(rename = "router:external", default)]
    pub external: bool,
    #[serde(rename = "provider:physical_network", default)]
    pub physical_network: Option<String>,
    #[serde(rename = "provider:network_type", default)]
    pub network_type: Option<String>,
    #[serde(rename = "provider:segmentation_id", default)]
    pub segmentation_id: Option<u32>,
}

/// An address range handed out to instances on a subnet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPool {
    pub start: String,
    pub end: String,
}

/// A layer-3 subnet within a network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubnetData {
    pub id: String,
    pub name: String,
    pub enable_dhcp: bool,
    #[serde(default)]
    pub allocation_pools: Vec<AllocationPool>,
    #[serde(default)]
    pub gateway_ip: Option<String>,
    pub ip_version: u8,
    pub cidr: String,
    pub network_id: String,
    pub tenant_id: String,
}

/// A static route entry configured on a router.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub destination: String,
    pub nexthop: String,
}

/// External gateway attachment of a router.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExternalGatewayInfo {
    pub network_id: String,
}

/// A virtual router.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouterData {
    pub id: String,
    pub name: String,
    pub admin_state_up: bool,
    #[serde(default)]
    pub routes: Vec<StaticRoute>,
    #[serde(default)]
    pub external_gateway_info: Option<ExternalGatewayInfo>,
    pub tenant_id: String,
}

/// A fixed address bound to a port.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixedIp {
    pub ip_address: String,
    pub subnet_id: String,
}

/// A port on a network; `device_id` links it to the device it serves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortData {
    pub id: String,
    pub network_id: String,
    pub mac_address: String,
    pub device_id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
}

/// A floating IP allocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FloatingIpData {
    pub id: String,
    pub tenant_id: String,
    pub floating_network_id: String,
    #[serde(default)]
    pub fixed_ip_address: Option<String>,
    pub floating_ip_address: String,
}

/// A firewall rule owned by a security group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityGroupRuleData {
    pub id: String,
    pub direction: String,
    #[serde(default)]
    pub remote_ip_prefix: Option<String>,
    /// Absent for the provider's placeholder rules
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub port_range_min: Option<u16>,
    #[serde(default)]
    pub port_range_max: Option<u16>,
    pub ethertype: String,
    #[serde(default)]
    pub remote_group_id: Option<String>,
    pub security_group_id: String,
    pub tenant_id: String,
}

/// A security group with its rules inlined.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityGroupData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tenant_id: String,
    #[serde(default)]
    pub security_group_rules: Vec<SecurityGroupRuleData>,
}

/// A load-balancer pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbPoolData {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub subnet_id: String,
    pub protocol: String,
    pub lb_method: String,
    #[serde(default)]
    pub provider: Option<String>,
    /// Health monitors associated with this pool
    #[serde(default)]
    pub health_monitors: Vec<String>,
}

/// A load-balancer health monitor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbMonitorData {
    pub id: String,
    pub tenant_id: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub delay: u32,
    pub timeout: u32,
    pub max_retries: u32,
}

/// A backend member of a load-balancer pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbMemberData {
    pub id: String,
    pub tenant_id: String,
    pub pool_id: String,
    pub address: String,
    pub protocol_port: u16,
    pub weight: u32,
}

/// A load-balancer virtual IP.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbVipData {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub pool_id: String,
    pub subnet_id: String,
    pub address: String,
    pub protocol: String,
    pub protocol_port: u16,
}
