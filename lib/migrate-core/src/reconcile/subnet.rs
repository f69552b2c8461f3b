//! Subnet upsert.

use super::{KindOutcome, Reconciler};
use crate::resolve;
use crate::snapshot::Snapshot;
use crate::Result;
use migrate_api::payload::SubnetCreate;
use migrate_api::ResourceKind;
use std::collections::HashSet;

impl Reconciler<'_> {
    pub(super) async fn reconcile_subnets(&self, snapshot: &Snapshot) -> Result<KindOutcome> {
        let dst_networks = self.dst_networks().await?;
        let existing = self.dst_subnets().await?;
        let index: HashSet<_> = existing.iter().map(|s| &s.identity_hash).collect();
        let mut outcome = KindOutcome::default();

        for snet in &snapshot.subnets {
            if index.contains(&snet.identity_hash) {
                self.reporter.skipped(
                    ResourceKind::Subnet,
                    &snet.spec.name,
                    "destination already has a subnet with this identity",
                );
                outcome.record_skipped();
                continue;
            }
            if snet.spec.external && !self.config.migrate_extnets {
                self.reporter.skipped(
                    ResourceKind::Subnet,
                    &snet.spec.name,
                    "external networks excluded by configuration",
                );
                outcome.record_skipped();
                continue;
            }

            let network_id = resolve::dest_id(
                &snapshot.networks,
                &dst_networks,
                &snet.spec.network_id,
                "network",
            )?
            .to_string();
            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&snet.spec.tenant_name)
                .await?;

            let payload = SubnetCreate {
                name: snet.spec.name.clone(),
                enable_dhcp: snet.spec.enable_dhcp,
                network_id,
                cidr: snet.spec.cidr.clone(),
                allocation_pools: snet.spec.allocation_pools.clone(),
                gateway_ip: snet.spec.gateway_ip.clone(),
                ip_version: snet.spec.ip_version,
                tenant_id,
            };

            let created = self.dst.network.create_subnet(&payload).await?;
            self.reporter
                .created(ResourceKind::Subnet, &snet.spec.name, &created.id);
            outcome.record_created(&snet.native_id, &created.id, &snet.spec.name);
        }

        Ok(outcome)
    }
}
