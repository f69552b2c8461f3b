//! Load-balancer chain upsert: pools, monitors, associations, members,
//! VIPs.
//!
//! Monitors and pools are created independently and tied together in an
//! explicit association pass that runs strictly after both sides exist;
//! the association itself is idempotent.

use super::{KindOutcome, Reconciler};
use crate::resolve;
use crate::snapshot::Snapshot;
use crate::Result;
use migrate_api::payload::{LbMemberCreate, LbPoolCreate, LbVipCreate};
use migrate_api::ResourceKind;
use std::collections::HashSet;

impl Reconciler<'_> {
    pub(super) async fn reconcile_lb_pools(&self, snapshot: &Snapshot) -> Result<KindOutcome> {
        let dst_subnets = self.dst_subnets().await?;
        let existing = self.dst_lb_pools().await?;
        let index: HashSet<_> = existing.iter().map(|p| &p.identity_hash).collect();
        let mut outcome = KindOutcome::default();

        for pool in &snapshot.lb_pools {
            if index.contains(&pool.identity_hash) {
                self.reporter.skipped(
                    ResourceKind::LbPool,
                    &pool.spec.name,
                    "destination already has a pool with this identity",
                );
                outcome.record_skipped();
                continue;
            }

            let subnet_id = resolve::dest_id(
                &snapshot.subnets,
                &dst_subnets,
                &pool.spec.subnet_id,
                "subnet",
            )?
            .to_string();
            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&pool.spec.tenant_name)
                .await?;

            let payload = LbPoolCreate {
                name: pool.spec.name.clone(),
                tenant_id,
                subnet_id,
                protocol: pool.spec.protocol.clone(),
                lb_method: pool.spec.lb_method.clone(),
                provider: pool.spec.provider.clone(),
            };

            let created = self.dst.network.create_lb_pool(&payload).await?;
            self.reporter
                .created(ResourceKind::LbPool, &pool.spec.name, &created.id);
            outcome.record_created(&pool.native_id, &created.id, &pool.spec.name);
        }

        Ok(outcome)
    }

    pub(super) async fn reconcile_lb_monitors(&self, snapshot: &Snapshot) -> Result<KindOutcome> {
        let existing = self.dst_lb_monitors().await?;
        let index: HashSet<_> = existing.iter().map(|m| &m.identity_hash).collect();
        let mut outcome = KindOutcome::default();

        for monitor in &snapshot.lb_monitors {
            if index.contains(&monitor.identity_hash) {
                self.reporter.skipped(
                    ResourceKind::LbMonitor,
                    &monitor.spec.monitor_type,
                    "destination already has a monitor with this identity",
                );
                outcome.record_skipped();
                continue;
            }

            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&monitor.spec.tenant_name)
                .await?;
            let payload = migrate_api::payload::LbMonitorCreate {
                tenant_id,
                monitor_type: monitor.spec.monitor_type.clone(),
                delay: monitor.spec.delay,
                timeout: monitor.spec.timeout,
                max_retries: monitor.spec.max_retries,
            };

            let created = self.dst.network.create_lb_monitor(&payload).await?;
            self.reporter
                .created(ResourceKind::LbMonitor, &monitor.spec.monitor_type, &created.id);
            outcome.record_created(&monitor.native_id, &created.id, &monitor.spec.monitor_type);
        }

        Ok(outcome)
    }

    /// Many-to-many pool/monitor ties. Runs after both passes above so
    /// every side already has a destination twin.
    pub(super) async fn reconcile_lb_associations(
        &self,
        snapshot: &Snapshot,
    ) -> Result<KindOutcome> {
        let dst_pools = self.dst_lb_pools().await?;
        let dst_monitors = self.dst_lb_monitors().await?;
        let mut outcome = KindOutcome::default();

        for pool in &snapshot.lb_pools {
            let dst_pool = resolve::find_by_hash(&dst_pools, &pool.identity_hash, "lb pool")?;

            for monitor_id in &pool.spec.health_monitors {
                let dst_monitor_id = resolve::dest_id(
                    &snapshot.lb_monitors,
                    &dst_monitors,
                    monitor_id,
                    "lb monitor",
                )?;

                if dst_pool
                    .spec
                    .health_monitors
                    .iter()
                    .any(|m| m == dst_monitor_id)
                {
                    self.reporter.skipped(
                        ResourceKind::LbMonitor,
                        &pool.spec.name,
                        "destination pool already lists this monitor",
                    );
                    outcome.record_skipped();
                    continue;
                }

                self.dst
                    .network
                    .associate_monitor(&dst_pool.native_id, dst_monitor_id)
                    .await?;
                self.reporter
                    .created(ResourceKind::LbMonitor, &pool.spec.name, dst_monitor_id);
                outcome.record_created(monitor_id, dst_monitor_id, &pool.spec.name);
            }
        }

        Ok(outcome)
    }

    pub(super) async fn reconcile_lb_members(&self, snapshot: &Snapshot) -> Result<KindOutcome> {
        let dst_pools = self.dst_lb_pools().await?;
        let existing = self.dst_lb_members().await?;
        let index: HashSet<_> = existing.iter().map(|m| &m.identity_hash).collect();
        let mut outcome = KindOutcome::default();

        for member in &snapshot.lb_members {
            if index.contains(&member.identity_hash) {
                self.reporter.skipped(
                    ResourceKind::LbMember,
                    &member.spec.address,
                    "destination already has a member with this identity",
                );
                outcome.record_skipped();
                continue;
            }

            let pool_id = resolve::dest_id(
                &snapshot.lb_pools,
                &dst_pools,
                &member.spec.pool_id,
                "lb pool",
            )?
            .to_string();
            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&member.spec.tenant_name)
                .await?;

            let payload = LbMemberCreate {
                tenant_id,
                pool_id,
                address: member.spec.address.clone(),
                protocol_port: member.spec.protocol_port,
                weight: member.spec.weight,
            };

            let created = self.dst.network.create_lb_member(&payload).await?;
            self.reporter
                .created(ResourceKind::LbMember, &member.spec.address, &created.id);
            outcome.record_created(&member.native_id, &created.id, &member.spec.address);
        }

        Ok(outcome)
    }

    pub(super) async fn reconcile_lb_vips(&self, snapshot: &Snapshot) -> Result<KindOutcome> {
        let dst_pools = self.dst_lb_pools().await?;
        let dst_subnets = self.dst_subnets().await?;
        let existing = self.dst_lb_vips().await?;
        let index: HashSet<_> = existing.iter().map(|v| &v.identity_hash).collect();
        let mut outcome = KindOutcome::default();

        for vip in &snapshot.lb_vips {
            if index.contains(&vip.identity_hash) {
                self.reporter.skipped(
                    ResourceKind::LbVip,
                    &vip.spec.name,
                    "destination already has a vip with this identity",
                );
                outcome.record_skipped();
                continue;
            }

            let pool_id =
                resolve::dest_id(&snapshot.lb_pools, &dst_pools, &vip.spec.pool_id, "lb pool")?
                    .to_string();
            let subnet_id = resolve::dest_id(
                &snapshot.subnets,
                &dst_subnets,
                &vip.spec.subnet_id,
                "subnet",
            )?
            .to_string();
            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&vip.spec.tenant_name)
                .await?;

            let payload = LbVipCreate {
                name: vip.spec.name.clone(),
                tenant_id,
                pool_id,
                subnet_id,
                address: vip.spec.address.clone(),
                protocol: vip.spec.protocol.clone(),
                protocol_port: vip.spec.protocol_port,
            };

            let created = self.dst.network.create_lb_vip(&payload).await?;
            self.reporter
                .created(ResourceKind::LbVip, &vip.spec.name, &created.id);
            outcome.record_created(&vip.native_id, &created.id, &vip.spec.name);
        }

        Ok(outcome)
    }
}
