//! Creation payloads sent to the destination control plane.
//!
//! Every id embedded here is destination-space: tenants are remapped through
//! the identity collaborator and foreign keys through identity-hash
//! resolution before a payload is built.

use crate::native::{AllocationPool, ExternalGatewayInfo, StaticRoute};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkCreate {
    pub name: String,
    pub admin_state_up: bool,
    pub tenant_id: String,
    pub shared: bool,
    #[serde(rename = "router:external", default)]
    pub external: bool,
    /// Provider attributes travel only for external networks
    #[serde(rename = "provider:physical_network", skip_serializing_if = "Option::is_none")]
    pub physical_network: Option<String>,
    #[serde(rename = "provider:network_type", skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,
    #[serde(rename = "provider:segmentation_id", skip_serializing_if = "Option::is_none")]
    pub segmentation_id: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubnetCreate {
    pub name: String,
    pub enable_dhcp: bool,
    pub network_id: String,
    pub cidr: String,
    pub allocation_pools: Vec<AllocationPool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
    pub ip_version: u8,
    pub tenant_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouterCreate {
    pub name: String,
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_gateway_info: Option<ExternalGatewayInfo>,
    #[serde(default)]
    pub routes: Vec<StaticRoute>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityGroupCreate {
    pub name: String,
    pub tenant_id: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityGroupRuleCreate {
    pub direction: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range_min: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range_max: Option<u16>,
    pub ethertype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_group_id: Option<String>,
    pub security_group_id: String,
    pub tenant_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbPoolCreate {
    pub name: String,
    pub tenant_id: String,
    pub subnet_id: String,
    pub protocol: String,
    pub lb_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbMonitorCreate {
    pub tenant_id: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub delay: u32,
    pub timeout: u32,
    pub max_retries: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbMemberCreate {
    pub tenant_id: String,
    pub pool_id: String,
    pub address: String,
    pub protocol_port: u16,
    pub weight: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbVipCreate {
    pub name: String,
    pub tenant_id: String,
    pub pool_id: String,
    pub subnet_id: String,
    pub address: String,
    pub protocol: String,
    pub protocol_port: u16,
}
