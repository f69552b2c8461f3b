//! Snapshot reading: one cloud's topology as canonical records.

use crate::cloud::CloudHandle;
use crate::convert;
use crate::Result;
use migrate_api::canonical::{
    Canonical, FloatingIpSpec, LbMemberSpec, LbMonitorSpec, LbPoolSpec, LbVipSpec, NetworkSpec,
    RouterSpec, SecurityGroupSpec, SubnetSpec,
};
use migrate_api::MigrationConfig;
use tracing::debug;

/// Canonical view of one cloud at one point in time. Built fresh for every
/// migration run and discarded when the run finishes.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub networks: Vec<Canonical<NetworkSpec>>,
    pub subnets: Vec<Canonical<SubnetSpec>>,
    pub routers: Vec<Canonical<RouterSpec>>,
    pub floating_ips: Vec<Canonical<FloatingIpSpec>>,
    pub security_groups: Vec<Canonical<SecurityGroupSpec>>,
    pub lb_pools: Vec<Canonical<LbPoolSpec>>,
    pub lb_monitors: Vec<Canonical<LbMonitorSpec>>,
    pub lb_members: Vec<Canonical<LbMemberSpec>>,
    pub lb_vips: Vec<Canonical<LbVipSpec>>,
}

/// Reads every configured resource kind from one cloud and converts each
/// record into its canonical form.
pub struct SnapshotReader<'a> {
    cloud: &'a CloudHandle,
    config: &'a MigrationConfig,
}

impl<'a> SnapshotReader<'a> {
    pub fn new(cloud: &'a CloudHandle, config: &'a MigrationConfig) -> Self {
        Self { cloud, config }
    }

    pub async fn read(&self) -> Result<Snapshot> {
        let identity = self.cloud.identity.as_ref();
        let tenant = self.config.tenant_filter();

        let networks_raw = self.cloud.network.list_networks().await?;
        let subnets_raw = self.cloud.network.list_subnets().await?;
        let ports_raw = self.cloud.network.list_ports().await?;

        let mut snapshot = Snapshot::default();

        for net in &networks_raw {
            let record = convert::network(identity, &subnets_raw, net).await?;
            // shared and external networks stay visible to every tenant:
            // they are legitimate reference targets even under a filter
            let keep = match tenant {
                Some(t) => record.spec.tenant_name == t || net.shared || net.external,
                None => true,
            };
            if keep {
                snapshot.networks.push(record);
            }
        }

        for snet in &subnets_raw {
            let record = convert::subnet(identity, &networks_raw, snet).await?;
            let keep = match tenant {
                Some(t) => record.spec.tenant_name == t || record.spec.external,
                None => true,
            };
            if keep {
                snapshot.subnets.push(record);
            }
        }

        for rtr in &self.cloud.network.list_routers().await? {
            let record = convert::router(identity, &networks_raw, &ports_raw, rtr).await?;
            if tenant.is_none_or_matches(&record.spec.tenant_name) {
                snapshot.routers.push(record);
            }
        }

        if self.config.keep_floatingip {
            for fip in &self.cloud.network.list_floating_ips().await? {
                let record = convert::floating_ip(identity, &networks_raw, fip).await?;
                if tenant.is_none_or_matches(&record.spec.tenant_name) {
                    snapshot.floating_ips.push(record);
                }
            }
        }

        for group in &self.cloud.network.list_security_groups().await? {
            let record = convert::security_group(identity, group).await?;
            if tenant.is_none_or_matches(&record.spec.tenant_name) {
                snapshot.security_groups.push(record);
            }
        }

        if self.config.keep_lbaas {
            for pool in &self.cloud.network.list_lb_pools().await? {
                let record = convert::lb_pool(identity, pool).await?;
                if tenant.is_none_or_matches(&record.spec.tenant_name) {
                    snapshot.lb_pools.push(record);
                }
            }
            for monitor in &self.cloud.network.list_lb_monitors().await? {
                let record = convert::lb_monitor(identity, monitor).await?;
                if tenant.is_none_or_matches(&record.spec.tenant_name) {
                    snapshot.lb_monitors.push(record);
                }
            }
            for member in &self.cloud.network.list_lb_members().await? {
                let record = convert::lb_member(identity, member).await?;
                if tenant.is_none_or_matches(&record.spec.tenant_name) {
                    snapshot.lb_members.push(record);
                }
            }
            for vip in &self.cloud.network.list_lb_vips().await? {
                let record = convert::lb_vip(identity, vip).await?;
                if tenant.is_none_or_matches(&record.spec.tenant_name) {
                    snapshot.lb_vips.push(record);
                }
            }
        }

        debug!(
            networks = snapshot.networks.len(),
            subnets = snapshot.subnets.len(),
            routers = snapshot.routers.len(),
            floating_ips = snapshot.floating_ips.len(),
            security_groups = snapshot.security_groups.len(),
            "snapshot read"
        );
        Ok(snapshot)
    }
}

trait TenantFilterExt {
    fn is_none_or_matches(&self, tenant_name: &str) -> bool;
}

impl TenantFilterExt for Option<&str> {
    fn is_none_or_matches(&self, tenant_name: &str) -> bool {
        match self {
            Some(t) => *t == tenant_name,
            None => true,
        }
    }
}
