//! Control-plane collaborator interfaces.
//!
//! The reconciler talks to both clouds exclusively through these traits;
//! whatever transport sits behind them is out of scope here.

use crate::Result;
use migrate_api::native::{
    FloatingIpData, LbMemberData, LbMonitorData, LbPoolData, LbVipData, NetworkData, PortData,
    RouterData, SecurityGroupData, SecurityGroupRuleData, SubnetData,
};
use migrate_api::payload::{
    LbMemberCreate, LbMonitorCreate, LbPoolCreate, LbVipCreate, NetworkCreate, RouterCreate,
    SecurityGroupCreate, SecurityGroupRuleCreate, SubnetCreate,
};
use std::sync::Arc;

/// Outcome of one floating-IP allocation attempt.
///
/// Exhaustion of the address pool is the normal terminator of the
/// saturation loop, not a fault, so it is an arm here rather than an error.
#[derive(Clone, Debug)]
pub enum FloatingIpAllocation {
    Allocated(FloatingIpData),
    Exhausted,
}

/// Network control plane of one cloud.
#[async_trait::async_trait]
pub trait NetworkApi: Send + Sync {
    async fn list_networks(&self) -> Result<Vec<NetworkData>>;
    async fn list_subnets(&self) -> Result<Vec<SubnetData>>;
    async fn list_routers(&self) -> Result<Vec<RouterData>>;
    async fn list_ports(&self) -> Result<Vec<PortData>>;
    async fn list_floating_ips(&self) -> Result<Vec<FloatingIpData>>;
    async fn list_security_groups(&self) -> Result<Vec<SecurityGroupData>>;
    async fn list_lb_pools(&self) -> Result<Vec<LbPoolData>>;
    async fn list_lb_monitors(&self) -> Result<Vec<LbMonitorData>>;
    async fn list_lb_members(&self) -> Result<Vec<LbMemberData>>;
    async fn list_lb_vips(&self) -> Result<Vec<LbVipData>>;

    async fn create_network(&self, payload: &NetworkCreate) -> Result<NetworkData>;
    async fn create_subnet(&self, payload: &SubnetCreate) -> Result<SubnetData>;
    async fn create_router(&self, payload: &RouterCreate) -> Result<RouterData>;
    async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()>;

    /// Allocate one floating IP on an external network. The address is
    /// chosen by the provider and cannot be requested by value.
    async fn allocate_floating_ip(
        &self,
        network_id: &str,
        tenant_id: Option<&str>,
    ) -> Result<FloatingIpAllocation>;
    async fn delete_floating_ip(&self, floating_ip_id: &str) -> Result<()>;

    async fn create_security_group(&self, payload: &SecurityGroupCreate)
        -> Result<SecurityGroupData>;
    async fn create_security_group_rule(
        &self,
        payload: &SecurityGroupRuleCreate,
    ) -> Result<SecurityGroupRuleData>;

    async fn create_lb_pool(&self, payload: &LbPoolCreate) -> Result<LbPoolData>;
    async fn create_lb_monitor(&self, payload: &LbMonitorCreate) -> Result<LbMonitorData>;
    async fn associate_monitor(&self, pool_id: &str, monitor_id: &str) -> Result<()>;
    async fn create_lb_member(&self, payload: &LbMemberCreate) -> Result<LbMemberData>;
    async fn create_lb_vip(&self, payload: &LbVipCreate) -> Result<LbVipData>;
}

/// Identity collaborator, consistent on both clouds: tenants with the same
/// name are logically the same tenant even though their ids differ.
#[async_trait::async_trait]
pub trait IdentityApi: Send + Sync {
    async fn tenant_id_by_name(&self, name: &str) -> Result<String>;
    async fn tenant_name_by_id(&self, id: &str) -> Result<String>;
}

/// Bundle of the collaborators for one cloud.
#[derive(Clone)]
pub struct CloudHandle {
    pub network: Arc<dyn NetworkApi>,
    pub identity: Arc<dyn IdentityApi>,
}

impl CloudHandle {
    pub fn new(network: Arc<dyn NetworkApi>, identity: Arc<dyn IdentityApi>) -> Self {
        Self { network, identity }
    }
}
