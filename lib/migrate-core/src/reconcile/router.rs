//! Router upsert and interface attachment.
//!
//! Routers use a weaker match than a plain hash test: two routers can be
//! semantically identical by name, routes, and tenant while serving
//! disjoint address space, so an existing same-hash router only suppresses
//! the create when its bound IPs overlap the source router's.

use super::{KindOutcome, Reconciler};
use crate::resolve;
use crate::snapshot::Snapshot;
use crate::Result;
use migrate_api::canonical::{Canonical, RouterSpec, SubnetSpec};
use migrate_api::native::ExternalGatewayInfo;
use migrate_api::payload::RouterCreate;
use migrate_api::ResourceKind;
use std::collections::HashSet;

impl Reconciler<'_> {
    pub(super) async fn reconcile_routers(&self, snapshot: &Snapshot) -> Result<KindOutcome> {
        let dst_networks = self.dst_networks().await?;
        let dst_subnets = self.dst_subnets().await?;
        let existing = self.dst_routers().await?;
        let mut outcome = KindOutcome::default();

        for router in &snapshot.routers {
            if let Some(twin) = existing
                .iter()
                .find(|r| r.identity_hash == router.identity_hash)
            {
                let src_ips: HashSet<&String> = router.spec.ips.iter().collect();
                if twin.spec.ips.iter().any(|ip| src_ips.contains(ip)) {
                    self.reporter.skipped(
                        ResourceKind::Router,
                        &router.spec.name,
                        "destination router with this identity shares bound addresses",
                    );
                    outcome.record_skipped();
                    continue;
                }
                // same identity but disjoint address space: a distinct
                // router that happens to share name, routes, and tenant
            }

            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&router.spec.tenant_name)
                .await?;

            let mut gateway_network_id = None;
            if let Some(ext_net_id) = &router.spec.ext_net_id {
                if self.config.migrate_extnets {
                    let dest_net_id = resolve::dest_id(
                        &snapshot.networks,
                        &dst_networks,
                        ext_net_id,
                        "external network",
                    )?
                    .to_string();
                    gateway_network_id = Some(dest_net_id);
                } else {
                    self.reporter.skipped(
                        ResourceKind::Router,
                        &router.spec.name,
                        "external gateway dropped: external networks excluded by configuration",
                    );
                }
            }

            let payload = RouterCreate {
                name: router.spec.name.clone(),
                tenant_id,
                external_gateway_info: gateway_network_id
                    .clone()
                    .map(|network_id| ExternalGatewayInfo { network_id }),
                routes: router.spec.routes.clone(),
            };

            let created = self.dst.network.create_router(&payload).await?;
            self.reporter
                .created(ResourceKind::Router, &router.spec.name, &created.id);
            outcome.record_created(&router.native_id, &created.id, &router.spec.name);

            self.attach_router_interfaces(
                router,
                &created.id,
                gateway_network_id.as_deref(),
                &snapshot.subnets,
                &dst_subnets,
            )
            .await?;
        }

        Ok(outcome)
    }

    /// Attach the destination twins of the source router's subnets.
    /// External subnets never get an interface: the gateway attachment
    /// already covers the external network, and attaching it again as an
    /// interface would double-bind it.
    async fn attach_router_interfaces(
        &self,
        router: &Canonical<RouterSpec>,
        dest_router_id: &str,
        gateway_network_id: Option<&str>,
        src_subnets: &[Canonical<SubnetSpec>],
        dst_subnets: &[Canonical<SubnetSpec>],
    ) -> Result<()> {
        for subnet_id in &router.spec.subnet_ids {
            let src_subnet = src_subnets
                .iter()
                .find(|s| &s.native_id == subnet_id)
                .ok_or_else(|| crate::MigrateError::not_found("subnet", subnet_id.clone()))?;
            if src_subnet.spec.external {
                continue;
            }

            let dst_subnet =
                resolve::find_by_hash(dst_subnets, &src_subnet.identity_hash, "subnet")?;
            if Some(dst_subnet.spec.network_id.as_str()) == gateway_network_id {
                continue;
            }

            self.dst
                .network
                .add_router_interface(dest_router_id, &dst_subnet.native_id)
                .await?;
        }
        Ok(())
    }
}
