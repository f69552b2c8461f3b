//! Canonical, cloud-agnostic resource representations.
//!
//! A canonical record is what two independently operated clouds can agree
//! on: user-facing attributes plus denormalized names (tenant name instead
//! of tenant id) so that content, not provider-assigned ids, defines
//! identity. Foreign keys inside a spec stay in the id space of the cloud
//! the record was read from; the reconciler translates them through
//! identity-hash resolution.

use crate::native::{AllocationPool, StaticRoute};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-derived identity of a resource, comparable across clouds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityHash(String);

impl IdentityHash {
    pub fn new(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonical record: one resource's portable spec plus the id it carries
/// in the cloud it was read from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Canonical<T> {
    /// Id within the owning cloud; never comparable across clouds
    pub native_id: String,
    pub identity_hash: IdentityHash,
    pub spec: T,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub admin_state_up: bool,
    pub shared: bool,
    pub tenant_name: String,
    /// Names of the subnets carved from this network (denormalized)
    pub subnet_names: Vec<String>,
    pub external: bool,
    pub physical_network: Option<String>,
    pub network_type: Option<String>,
    pub segmentation_id: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub name: String,
    pub enable_dhcp: bool,
    pub allocation_pools: Vec<AllocationPool>,
    pub gateway_ip: Option<String>,
    pub ip_version: u8,
    pub cidr: String,
    /// Owning network, in the id space of the cloud this record came from
    pub network_id: String,
    pub network_name: String,
    /// Whether the owning network is external (denormalized)
    pub external: bool,
    pub tenant_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouterSpec {
    pub name: String,
    pub admin_state_up: bool,
    pub routes: Vec<StaticRoute>,
    pub tenant_name: String,
    /// Every address bound to this router's ports
    pub ips: Vec<String>,
    /// Subnets this router has an interface on (source-space ids)
    pub subnet_ids: Vec<String>,
    /// External gateway network, when attached
    pub ext_net_id: Option<String>,
    pub ext_net_name: Option<String>,
    pub ext_net_tenant_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FloatingIpSpec {
    pub tenant_name: String,
    /// External network the address lives on (source-space id)
    pub floating_network_id: String,
    pub network_name: String,
    pub ext_net_tenant_name: String,
    pub fixed_ip_address: Option<String>,
    pub floating_ip_address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityGroupRuleSpec {
    pub direction: String,
    pub remote_ip_prefix: Option<String>,
    pub protocol: Option<String>,
    pub port_range_min: Option<u16>,
    pub port_range_max: Option<u16>,
    pub ethertype: String,
    /// Peer group granting access, when the rule is group-scoped
    pub remote_group_id: Option<String>,
    /// Owning group (source-space id); deliberately outside the identity
    pub security_group_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub name: String,
    pub tenant_name: String,
    pub description: String,
    /// Rules owned by this group
    pub rules: Vec<Canonical<SecurityGroupRuleSpec>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbPoolSpec {
    pub name: String,
    pub tenant_name: String,
    /// Subnet the pool fronts (source-space id)
    pub subnet_id: String,
    pub protocol: String,
    pub lb_method: String,
    pub provider: Option<String>,
    /// Associated health monitors (source-space ids)
    pub health_monitors: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbMonitorSpec {
    pub tenant_name: String,
    pub monitor_type: String,
    pub delay: u32,
    pub timeout: u32,
    pub max_retries: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbMemberSpec {
    pub tenant_name: String,
    /// Owning pool (source-space id)
    pub pool_id: String,
    pub address: String,
    pub protocol_port: u16,
    pub weight: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LbVipSpec {
    pub name: String,
    pub tenant_name: String,
    /// Owning pool and subnet (source-space ids)
    pub pool_id: String,
    pub subnet_id: String,
    pub address: String,
    pub protocol: String,
    pub protocol_port: u16,
}
