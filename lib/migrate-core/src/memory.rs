//! In-memory control plane.
//!
//! Implements both collaborator traits over in-process state so a whole
//! reconciliation can be rehearsed without touching a live cloud. The
//! floating-IP pool is bounded per external network, which is what makes
//! the saturation loop terminate.

use crate::cloud::{CloudHandle, FloatingIpAllocation, IdentityApi, NetworkApi};
use crate::error::MigrateError;
use crate::Result;
use ipnetwork::Ipv4Network;
use migrate_api::native::{
    FixedIp, FloatingIpData, LbMemberData, LbMonitorData, LbPoolData, LbVipData, NetworkData,
    PortData, RouterData, SecurityGroupData, SecurityGroupRuleData, SubnetData,
};
use migrate_api::payload::{
    LbMemberCreate, LbMonitorCreate, LbPoolCreate, LbVipCreate, NetworkCreate, RouterCreate,
    SecurityGroupCreate, SecurityGroupRuleCreate, SubnetCreate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A tenant known to the identity collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
}

/// Allocatable floating-IP range of one external network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FloatingPool {
    pub network_id: String,
    pub cidr: String,
}

/// Serializable state of one cloud; the export format the controller
/// binary loads for rehearsal runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CloudExport {
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    #[serde(default)]
    pub networks: Vec<NetworkData>,
    #[serde(default)]
    pub subnets: Vec<SubnetData>,
    #[serde(default)]
    pub routers: Vec<RouterData>,
    #[serde(default)]
    pub ports: Vec<PortData>,
    #[serde(default)]
    pub floating_ips: Vec<FloatingIpData>,
    #[serde(default)]
    pub security_groups: Vec<SecurityGroupData>,
    #[serde(default)]
    pub lb_pools: Vec<LbPoolData>,
    #[serde(default)]
    pub lb_monitors: Vec<LbMonitorData>,
    #[serde(default)]
    pub lb_members: Vec<LbMemberData>,
    #[serde(default)]
    pub lb_vips: Vec<LbVipData>,
    #[serde(default)]
    pub floating_pools: Vec<FloatingPool>,
}

pub struct InMemoryCloud {
    state: RwLock<CloudExport>,
}

impl InMemoryCloud {
    pub fn new(export: CloudExport) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(export),
        })
    }

    /// Collaborator handle backed by this cloud.
    pub fn handle(self: &Arc<Self>) -> CloudHandle {
        CloudHandle::new(self.clone(), self.clone())
    }

    /// Copy of the current state, for inspection after a run.
    pub async fn export(&self) -> CloudExport {
        self.state.read().await.clone()
    }

    fn mint_id(prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4())
    }

    fn parse_pool(cidr: &str) -> Result<Ipv4Network> {
        cidr.parse()
            .map_err(|e| MigrateError::Transport(format!("bad pool cidr {cidr}: {e}")))
    }
}

#[async_trait::async_trait]
impl NetworkApi for InMemoryCloud {
    async fn list_networks(&self) -> Result<Vec<NetworkData>> {
        Ok(self.state.read().await.networks.clone())
    }

    async fn list_subnets(&self) -> Result<Vec<SubnetData>> {
        Ok(self.state.read().await.subnets.clone())
    }

    async fn list_routers(&self) -> Result<Vec<RouterData>> {
        Ok(self.state.read().await.routers.clone())
    }

    async fn list_ports(&self) -> Result<Vec<PortData>> {
        Ok(self.state.read().await.ports.clone())
    }

    async fn list_floating_ips(&self) -> Result<Vec<FloatingIpData>> {
        Ok(self.state.read().await.floating_ips.clone())
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroupData>> {
        Ok(self.state.read().await.security_groups.clone())
    }

    async fn list_lb_pools(&self) -> Result<Vec<LbPoolData>> {
        Ok(self.state.read().await.lb_pools.clone())
    }

    async fn list_lb_monitors(&self) -> Result<Vec<LbMonitorData>> {
        Ok(self.state.read().await.lb_monitors.clone())
    }

    async fn list_lb_members(&self) -> Result<Vec<LbMemberData>> {
        Ok(self.state.read().await.lb_members.clone())
    }

    async fn list_lb_vips(&self) -> Result<Vec<LbVipData>> {
        Ok(self.state.read().await.lb_vips.clone())
    }

    async fn create_network(&self, payload: &NetworkCreate) -> Result<NetworkData> {
        let mut state = self.state.write().await;
        let network = NetworkData {
            id: Self::mint_id("net"),
            name: payload.name.clone(),
            admin_state_up: payload.admin_state_up,
            shared: payload.shared,
            tenant_id: payload.tenant_id.clone(),
            subnets: vec![],
            external: payload.external,
            physical_network: payload.physical_network.clone(),
            network_type: payload.network_type.clone(),
            segmentation_id: payload.segmentation_id,
        };
        state.networks.push(network.clone());
        Ok(network)
    }

    async fn create_subnet(&self, payload: &SubnetCreate) -> Result<SubnetData> {
        let mut state = self.state.write().await;
        let subnet = SubnetData {
            id: Self::mint_id("sub"),
            name: payload.name.clone(),
            enable_dhcp: payload.enable_dhcp,
            allocation_pools: payload.allocation_pools.clone(),
            gateway_ip: payload.gateway_ip.clone(),
            ip_version: payload.ip_version,
            cidr: payload.cidr.clone(),
            network_id: payload.network_id.clone(),
            tenant_id: payload.tenant_id.clone(),
        };
        let network = state
            .networks
            .iter_mut()
            .find(|n| n.id == payload.network_id)
            .ok_or_else(|| MigrateError::not_found("network", payload.network_id.clone()))?;
        network.subnets.push(subnet.id.clone());
        state.subnets.push(subnet.clone());
        Ok(subnet)
    }

    async fn create_router(&self, payload: &RouterCreate) -> Result<RouterData> {
        let mut state = self.state.write().await;
        let router = RouterData {
            id: Self::mint_id("rtr"),
            name: payload.name.clone(),
            admin_state_up: true,
            routes: payload.routes.clone(),
            external_gateway_info: payload.external_gateway_info.clone(),
            tenant_id: payload.tenant_id.clone(),
        };
        state.routers.push(router.clone());
        Ok(router)
    }

    async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.routers.iter().any(|r| r.id == router_id) {
            return Err(MigrateError::not_found("router", router_id));
        }
        let subnet = state
            .subnets
            .iter()
            .find(|s| s.id == subnet_id)
            .ok_or_else(|| MigrateError::not_found("subnet", subnet_id))?;
        let address = subnet
            .gateway_ip
            .clone()
            .unwrap_or_else(|| subnet.cidr.clone());
        let port = PortData {
            id: Self::mint_id("port"),
            network_id: subnet.network_id.clone(),
            mac_address: format!("fa:16:3e:{:02x}:{:02x}:{:02x}", 0, 0, state.ports.len() as u8),
            device_id: router_id.to_string(),
            tenant_id: subnet.tenant_id.clone(),
            fixed_ips: vec![FixedIp {
                ip_address: address,
                subnet_id: subnet_id.to_string(),
            }],
        };
        state.ports.push(port);
        Ok(())
    }

    async fn allocate_floating_ip(
        &self,
        network_id: &str,
        tenant_id: Option<&str>,
    ) -> Result<FloatingIpAllocation> {
        let mut state = self.state.write().await;
        let cidr = state
            .floating_pools
            .iter()
            .find(|p| p.network_id == network_id)
            .map(|p| p.cidr.clone())
            .ok_or_else(|| MigrateError::not_found("floating pool", network_id))?;
        let pool = Self::parse_pool(&cidr)?;

        let in_use: HashSet<Ipv4Addr> = state
            .floating_ips
            .iter()
            .filter(|f| f.floating_network_id == network_id)
            .filter_map(|f| f.floating_ip_address.parse().ok())
            .collect();

        let free = pool
            .iter()
            .filter(|a| *a != pool.network() && *a != pool.broadcast())
            .find(|a| !in_use.contains(a));

        let Some(address) = free else {
            return Ok(FloatingIpAllocation::Exhausted);
        };

        let owner = match tenant_id {
            Some(id) => id.to_string(),
            None => state
                .networks
                .iter()
                .find(|n| n.id == network_id)
                .map(|n| n.tenant_id.clone())
                .ok_or_else(|| MigrateError::not_found("network", network_id))?,
        };

        let floating = FloatingIpData {
            id: Self::mint_id("fip"),
            tenant_id: owner,
            floating_network_id: network_id.to_string(),
            fixed_ip_address: None,
            floating_ip_address: address.to_string(),
        };
        state.floating_ips.push(floating.clone());
        Ok(FloatingIpAllocation::Allocated(floating))
    }

    async fn delete_floating_ip(&self, floating_ip_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.floating_ips.len();
        state.floating_ips.retain(|f| f.id != floating_ip_id);
        if state.floating_ips.len() == before {
            return Err(MigrateError::not_found("floating ip", floating_ip_id));
        }
        Ok(())
    }

    async fn create_security_group(
        &self,
        payload: &SecurityGroupCreate,
    ) -> Result<SecurityGroupData> {
        let mut state = self.state.write().await;
        let group = SecurityGroupData {
            id: Self::mint_id("sg"),
            name: payload.name.clone(),
            description: payload.description.clone(),
            tenant_id: payload.tenant_id.clone(),
            security_group_rules: vec![],
        };
        state.security_groups.push(group.clone());
        Ok(group)
    }

    async fn create_security_group_rule(
        &self,
        payload: &SecurityGroupRuleCreate,
    ) -> Result<SecurityGroupRuleData> {
        let mut state = self.state.write().await;
        let rule = SecurityGroupRuleData {
            id: Self::mint_id("rule"),
            direction: payload.direction.clone(),
            remote_ip_prefix: payload.remote_ip_prefix.clone(),
            protocol: Some(payload.protocol.clone()),
            port_range_min: payload.port_range_min,
            port_range_max: payload.port_range_max,
            ethertype: payload.ethertype.clone(),
            remote_group_id: payload.remote_group_id.clone(),
            security_group_id: payload.security_group_id.clone(),
            tenant_id: payload.tenant_id.clone(),
        };
        let group = state
            .security_groups
            .iter_mut()
            .find(|g| g.id == payload.security_group_id)
            .ok_or_else(|| {
                MigrateError::not_found("security group", payload.security_group_id.clone())
            })?;
        group.security_group_rules.push(rule.clone());
        Ok(rule)
    }

    async fn create_lb_pool(&self, payload: &LbPoolCreate) -> Result<LbPoolData> {
        let mut state = self.state.write().await;
        let pool = LbPoolData {
            id: Self::mint_id("pool"),
            name: payload.name.clone(),
            tenant_id: payload.tenant_id.clone(),
            subnet_id: payload.subnet_id.clone(),
            protocol: payload.protocol.clone(),
            lb_method: payload.lb_method.clone(),
            provider: payload.provider.clone(),
            health_monitors: vec![],
        };
        state.lb_pools.push(pool.clone());
        Ok(pool)
    }

    async fn create_lb_monitor(&self, payload: &LbMonitorCreate) -> Result<LbMonitorData> {
        let mut state = self.state.write().await;
        let monitor = LbMonitorData {
            id: Self::mint_id("mon"),
            tenant_id: payload.tenant_id.clone(),
            monitor_type: payload.monitor_type.clone(),
            delay: payload.delay,
            timeout: payload.timeout,
            max_retries: payload.max_retries,
        };
        state.lb_monitors.push(monitor.clone());
        Ok(monitor)
    }

    async fn associate_monitor(&self, pool_id: &str, monitor_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.lb_monitors.iter().any(|m| m.id == monitor_id) {
            return Err(MigrateError::not_found("lb monitor", monitor_id));
        }
        let pool = state
            .lb_pools
            .iter_mut()
            .find(|p| p.id == pool_id)
            .ok_or_else(|| MigrateError::not_found("lb pool", pool_id))?;
        if !pool.health_monitors.iter().any(|m| m == monitor_id) {
            pool.health_monitors.push(monitor_id.to_string());
        }
        Ok(())
    }

    async fn create_lb_member(&self, payload: &LbMemberCreate) -> Result<LbMemberData> {
        let mut state = self.state.write().await;
        if !state.lb_pools.iter().any(|p| p.id == payload.pool_id) {
            return Err(MigrateError::not_found("lb pool", payload.pool_id.clone()));
        }
        let member = LbMemberData {
            id: Self::mint_id("member"),
            tenant_id: payload.tenant_id.clone(),
            pool_id: payload.pool_id.clone(),
            address: payload.address.clone(),
            protocol_port: payload.protocol_port,
            weight: payload.weight,
        };
        state.lb_members.push(member.clone());
        Ok(member)
    }

    async fn create_lb_vip(&self, payload: &LbVipCreate) -> Result<LbVipData> {
        let mut state = self.state.write().await;
        if !state.lb_pools.iter().any(|p| p.id == payload.pool_id) {
            return Err(MigrateError::not_found("lb pool", payload.pool_id.clone()));
        }
        let vip = LbVipData {
            id: Self::mint_id("vip"),
            name: payload.name.clone(),
            tenant_id: payload.tenant_id.clone(),
            pool_id: payload.pool_id.clone(),
            subnet_id: payload.subnet_id.clone(),
            address: payload.address.clone(),
            protocol: payload.protocol.clone(),
            protocol_port: payload.protocol_port,
        };
        state.lb_vips.push(vip.clone());
        Ok(vip)
    }
}

#[async_trait::async_trait]
impl IdentityApi for InMemoryCloud {
    async fn tenant_id_by_name(&self, name: &str) -> Result<String> {
        self.state
            .read()
            .await
            .tenants
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id.clone())
            .ok_or_else(|| MigrateError::not_found("tenant", name))
    }

    async fn tenant_name_by_id(&self, id: &str) -> Result<String> {
        self.state
            .read()
            .await
            .tenants
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.clone())
            .ok_or_else(|| MigrateError::not_found("tenant", id))
    }
}
