//! The per-kind reconciler.
//!
//! One run walks the resource kinds in fixed dependency order and, per
//! kind, re-reads the destination's current state, skips every source
//! record whose identity already exists there, resolves the remaining
//! records' foreign keys, and creates them. Each create's destination id
//! is threaded forward in the run summary instead of being written back
//! into shared state.
//!
//! The window between the fresh read and the create is optimistic: a
//! destination modified concurrently by another actor can still produce
//! duplicates. One orchestrator per source/destination pair is assumed.

mod lb;
mod network;
mod router;
mod secgroup;
mod subnet;

use crate::cloud::CloudHandle;
use crate::convert;
use crate::floating::FloatingIpReallocator;
use crate::report::{Reporter, TracingReporter};
use crate::snapshot::Snapshot;
use crate::Result;
use migrate_api::canonical::{
    Canonical, LbMemberSpec, LbMonitorSpec, LbPoolSpec, LbVipSpec, NetworkSpec, RouterSpec,
    SecurityGroupSpec, SubnetSpec,
};
use migrate_api::{MigrationConfig, ResourceKind};
use std::sync::Arc;
use tracing::info;

/// One record created at the destination during this run.
#[derive(Clone, Debug)]
pub struct CreatedRecord {
    pub source_id: String,
    pub dest_id: String,
    pub name: String,
}

/// Outcome of one kind's upsert pass.
#[derive(Clone, Debug, Default)]
pub struct KindOutcome {
    pub created: Vec<CreatedRecord>,
    pub skipped: usize,
}

impl KindOutcome {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub(crate) fn record_created(&mut self, source_id: &str, dest_id: &str, name: &str) {
        self.created.push(CreatedRecord {
            source_id: source_id.to_string(),
            dest_id: dest_id.to_string(),
            name: name.to_string(),
        });
    }

    pub(crate) fn record_skipped(&mut self) {
        self.skipped += 1;
    }
}

/// Aggregate outcome of one reconciliation run.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub networks: KindOutcome,
    pub subnets: KindOutcome,
    pub routers: KindOutcome,
    pub floating_ips: KindOutcome,
    pub security_groups: KindOutcome,
    pub security_group_rules: KindOutcome,
    pub lb_pools: KindOutcome,
    pub lb_monitors: KindOutcome,
    pub lb_associations: KindOutcome,
    pub lb_members: KindOutcome,
    pub lb_vips: KindOutcome,
}

impl RunSummary {
    pub fn total_created(&self) -> usize {
        [
            &self.networks,
            &self.subnets,
            &self.routers,
            &self.floating_ips,
            &self.security_groups,
            &self.security_group_rules,
            &self.lb_pools,
            &self.lb_monitors,
            &self.lb_associations,
            &self.lb_members,
            &self.lb_vips,
        ]
        .iter()
        .map(|o| o.created_count())
        .sum()
    }
}

/// Drives one idempotent reconciliation pass against a destination cloud.
pub struct Reconciler<'a> {
    dst: &'a CloudHandle,
    config: &'a MigrationConfig,
    reporter: Arc<dyn Reporter>,
}

impl<'a> Reconciler<'a> {
    pub fn new(dst: &'a CloudHandle, config: &'a MigrationConfig) -> Self {
        Self::with_reporter(dst, config, Arc::new(TracingReporter))
    }

    pub fn with_reporter(
        dst: &'a CloudHandle,
        config: &'a MigrationConfig,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            dst,
            config,
            reporter,
        }
    }

    /// Execute one full pass over the source snapshot, in dependency
    /// order. Completed kinds stay in place on failure; re-running the
    /// whole pass is safe.
    pub async fn run(&self, snapshot: &Snapshot) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        summary.networks = self
            .reconcile_networks(snapshot)
            .await
            .map_err(|e| e.in_kind(ResourceKind::Network))?;
        summary.subnets = self
            .reconcile_subnets(snapshot)
            .await
            .map_err(|e| e.in_kind(ResourceKind::Subnet))?;
        summary.routers = self
            .reconcile_routers(snapshot)
            .await
            .map_err(|e| e.in_kind(ResourceKind::Router))?;

        if self.config.keep_floatingip {
            let reallocator = FloatingIpReallocator::new(self.dst, self.reporter.clone());
            summary.floating_ips = reallocator
                .run(&snapshot.floating_ips, &snapshot.networks)
                .await
                .map_err(|e| e.in_kind(ResourceKind::FloatingIp))?;
        }

        summary.security_groups = self
            .reconcile_security_groups(snapshot)
            .await
            .map_err(|e| e.in_kind(ResourceKind::SecurityGroup))?;
        summary.security_group_rules = self
            .reconcile_security_group_rules(snapshot)
            .await
            .map_err(|e| e.in_kind(ResourceKind::SecurityGroupRule))?;

        if self.config.keep_lbaas {
            summary.lb_pools = self
                .reconcile_lb_pools(snapshot)
                .await
                .map_err(|e| e.in_kind(ResourceKind::LbPool))?;
            summary.lb_monitors = self
                .reconcile_lb_monitors(snapshot)
                .await
                .map_err(|e| e.in_kind(ResourceKind::LbMonitor))?;
            summary.lb_associations = self
                .reconcile_lb_associations(snapshot)
                .await
                .map_err(|e| e.in_kind(ResourceKind::LbMonitor))?;
            summary.lb_members = self
                .reconcile_lb_members(snapshot)
                .await
                .map_err(|e| e.in_kind(ResourceKind::LbMember))?;
            summary.lb_vips = self
                .reconcile_lb_vips(snapshot)
                .await
                .map_err(|e| e.in_kind(ResourceKind::LbVip))?;
        }

        info!(created = summary.total_created(), "reconciliation finished");
        Ok(summary)
    }

    // Fresh destination reads. Never cached across kinds: each upsert pass
    // gates its creates on the state the destination has right now.

    pub(crate) async fn dst_networks(&self) -> Result<Vec<Canonical<NetworkSpec>>> {
        let networks = self.dst.network.list_networks().await?;
        let subnets = self.dst.network.list_subnets().await?;
        let mut out = Vec::with_capacity(networks.len());
        for net in &networks {
            out.push(convert::network(self.dst.identity.as_ref(), &subnets, net).await?);
        }
        Ok(out)
    }

    pub(crate) async fn dst_subnets(&self) -> Result<Vec<Canonical<SubnetSpec>>> {
        let networks = self.dst.network.list_networks().await?;
        let subnets = self.dst.network.list_subnets().await?;
        let mut out = Vec::with_capacity(subnets.len());
        for snet in &subnets {
            out.push(convert::subnet(self.dst.identity.as_ref(), &networks, snet).await?);
        }
        Ok(out)
    }

    pub(crate) async fn dst_routers(&self) -> Result<Vec<Canonical<RouterSpec>>> {
        let networks = self.dst.network.list_networks().await?;
        let ports = self.dst.network.list_ports().await?;
        let routers = self.dst.network.list_routers().await?;
        let mut out = Vec::with_capacity(routers.len());
        for rtr in &routers {
            out.push(convert::router(self.dst.identity.as_ref(), &networks, &ports, rtr).await?);
        }
        Ok(out)
    }

    pub(crate) async fn dst_security_groups(&self) -> Result<Vec<Canonical<SecurityGroupSpec>>> {
        let groups = self.dst.network.list_security_groups().await?;
        let mut out = Vec::with_capacity(groups.len());
        for group in &groups {
            out.push(convert::security_group(self.dst.identity.as_ref(), group).await?);
        }
        Ok(out)
    }

    pub(crate) async fn dst_lb_pools(&self) -> Result<Vec<Canonical<LbPoolSpec>>> {
        let pools = self.dst.network.list_lb_pools().await?;
        let mut out = Vec::with_capacity(pools.len());
        for pool in &pools {
            out.push(convert::lb_pool(self.dst.identity.as_ref(), pool).await?);
        }
        Ok(out)
    }

    pub(crate) async fn dst_lb_monitors(&self) -> Result<Vec<Canonical<LbMonitorSpec>>> {
        let monitors = self.dst.network.list_lb_monitors().await?;
        let mut out = Vec::with_capacity(monitors.len());
        for monitor in &monitors {
            out.push(convert::lb_monitor(self.dst.identity.as_ref(), monitor).await?);
        }
        Ok(out)
    }

    pub(crate) async fn dst_lb_members(&self) -> Result<Vec<Canonical<LbMemberSpec>>> {
        let members = self.dst.network.list_lb_members().await?;
        let mut out = Vec::with_capacity(members.len());
        for member in &members {
            out.push(convert::lb_member(self.dst.identity.as_ref(), member).await?);
        }
        Ok(out)
    }

    pub(crate) async fn dst_lb_vips(&self) -> Result<Vec<Canonical<LbVipSpec>>> {
        let vips = self.dst.network.list_lb_vips().await?;
        let mut out = Vec::with_capacity(vips.len());
        for vip in &vips {
            out.push(convert::lb_vip(self.dst.identity.as_ref(), vip).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests;
