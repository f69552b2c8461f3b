//! Network upsert.

use super::{KindOutcome, Reconciler};
use crate::snapshot::Snapshot;
use crate::Result;
use migrate_api::payload::NetworkCreate;
use migrate_api::ResourceKind;
use std::collections::HashSet;

impl Reconciler<'_> {
    pub(super) async fn reconcile_networks(&self, snapshot: &Snapshot) -> Result<KindOutcome> {
        let existing = self.dst_networks().await?;
        let index: HashSet<_> = existing.iter().map(|n| &n.identity_hash).collect();
        let mut outcome = KindOutcome::default();

        for net in &snapshot.networks {
            if index.contains(&net.identity_hash) {
                self.reporter.skipped(
                    ResourceKind::Network,
                    &net.spec.name,
                    "destination already has a network with this identity",
                );
                outcome.record_skipped();
                continue;
            }
            if net.spec.external && !self.config.migrate_extnets {
                self.reporter.skipped(
                    ResourceKind::Network,
                    &net.spec.name,
                    "external networks excluded by configuration",
                );
                outcome.record_skipped();
                continue;
            }

            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&net.spec.tenant_name)
                .await?;

            // provider attributes only travel for external networks, and
            // the segmentation id only for vlan segmentation
            let mut payload = NetworkCreate {
                name: net.spec.name.clone(),
                admin_state_up: net.spec.admin_state_up,
                tenant_id,
                shared: net.spec.shared,
                external: net.spec.external,
                physical_network: None,
                network_type: None,
                segmentation_id: None,
            };
            if net.spec.external {
                payload.physical_network = net.spec.physical_network.clone();
                payload.network_type = net.spec.network_type.clone();
                if net.spec.network_type.as_deref() == Some("vlan") {
                    payload.segmentation_id = net.spec.segmentation_id;
                }
            }

            let created = self.dst.network.create_network(&payload).await?;
            self.reporter
                .created(ResourceKind::Network, &net.spec.name, &created.id);
            outcome.record_created(&net.native_id, &created.id, &net.spec.name);
        }

        Ok(outcome)
    }
}
