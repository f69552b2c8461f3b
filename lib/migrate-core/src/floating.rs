//! Floating-IP reallocation.
//!
//! A provider hands out floating addresses; they cannot be requested by
//! value. To reproduce the source's addresses the destination pool is
//! first saturated — every free address materialized as a floating-IP
//! object — then each source address is re-tagged to its rightful tenant,
//! and finally every address the source does not claim is pruned.
//!
//! Re-tagging assumes that releasing an address into a saturated pool and
//! immediately reallocating on the same network yields the same address,
//! since it is the only free one.

use crate::cloud::{CloudHandle, FloatingIpAllocation};
use crate::error::MigrateError;
use crate::reconcile::KindOutcome;
use crate::report::Reporter;
use crate::resolve;
use crate::Result;
use migrate_api::canonical::{Canonical, FloatingIpSpec, NetworkSpec};
use migrate_api::ResourceKind;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub struct FloatingIpReallocator<'a> {
    dst: &'a CloudHandle,
    reporter: Arc<dyn Reporter>,
}

impl<'a> FloatingIpReallocator<'a> {
    pub fn new(dst: &'a CloudHandle, reporter: Arc<dyn Reporter>) -> Self {
        Self { dst, reporter }
    }

    pub async fn run(
        &self,
        src_floats: &[Canonical<FloatingIpSpec>],
        src_networks: &[Canonical<NetworkSpec>],
    ) -> Result<KindOutcome> {
        let dst_networks = self.dst_networks().await?;

        // every distinct external network the source claims addresses on,
        // translated to destination ids
        let mut target_networks: Vec<String> = Vec::new();
        for fip in src_floats {
            let dest_net_id = resolve::dest_id(
                src_networks,
                &dst_networks,
                &fip.spec.floating_network_id,
                "external network",
            )?;
            if !target_networks.iter().any(|n| n == dest_net_id) {
                target_networks.push(dest_net_id.to_string());
            }
        }

        for network_id in &target_networks {
            self.saturate(network_id).await?;
        }

        let mut outcome = KindOutcome::default();
        self.retag(src_floats, src_networks, &dst_networks, &mut outcome)
            .await?;
        self.prune(src_floats, &target_networks).await?;
        Ok(outcome)
    }

    /// Allocate until the provider reports the pool exhausted. A no-op on
    /// a pool that is already saturated.
    async fn saturate(&self, network_id: &str) -> Result<()> {
        let mut allocated = 0usize;
        loop {
            match self
                .dst
                .network
                .allocate_floating_ip(network_id, None)
                .await?
            {
                FloatingIpAllocation::Allocated(_) => allocated += 1,
                FloatingIpAllocation::Exhausted => break,
            }
        }
        debug!(network_id, allocated, "floating pool saturated");
        Ok(())
    }

    /// Move each matching destination address under the source's tenant.
    async fn retag(
        &self,
        src_floats: &[Canonical<FloatingIpSpec>],
        src_networks: &[Canonical<NetworkSpec>],
        dst_networks: &[Canonical<NetworkSpec>],
        outcome: &mut KindOutcome,
    ) -> Result<()> {
        let existing = self.dst.network.list_floating_ips().await?;

        for fip in src_floats {
            let address = &fip.spec.floating_ip_address;
            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&fip.spec.tenant_name)
                .await?;
            let dest_net_id = resolve::dest_id(
                src_networks,
                dst_networks,
                &fip.spec.floating_network_id,
                "external network",
            )?;

            let Some(twin) = existing.iter().find(|f| {
                &f.floating_ip_address == address && f.floating_network_id == dest_net_id
            }) else {
                // the address is outside the destination pool; saturation
                // cannot materialize it
                self.reporter.skipped(
                    ResourceKind::FloatingIp,
                    address,
                    "address not available at destination",
                );
                outcome.record_skipped();
                continue;
            };

            if twin.tenant_id == tenant_id {
                self.reporter.skipped(
                    ResourceKind::FloatingIp,
                    address,
                    "already owned by the right tenant",
                );
                outcome.record_skipped();
                continue;
            }

            self.dst.network.delete_floating_ip(&twin.id).await?;
            let reallocated = match self
                .dst
                .network
                .allocate_floating_ip(dest_net_id, Some(&tenant_id))
                .await?
            {
                FloatingIpAllocation::Allocated(f) => f,
                FloatingIpAllocation::Exhausted => {
                    return Err(MigrateError::Transport(format!(
                        "pool on {dest_net_id} exhausted while re-tagging {address}"
                    )));
                }
            };
            if &reallocated.floating_ip_address != address {
                return Err(MigrateError::Transport(format!(
                    "re-tagging {address} yielded {}: pool modified concurrently",
                    reallocated.floating_ip_address
                )));
            }

            self.reporter
                .created(ResourceKind::FloatingIp, address, &reallocated.id);
            outcome.record_created(&fip.native_id, &reallocated.id, address);
        }
        Ok(())
    }

    /// Remove every destination floating IP on a relevant network whose
    /// address the source does not claim, including the ones saturation
    /// itself consumed.
    async fn prune(
        &self,
        src_floats: &[Canonical<FloatingIpSpec>],
        target_networks: &[String],
    ) -> Result<()> {
        let claimed: HashSet<&str> = src_floats
            .iter()
            .map(|f| f.spec.floating_ip_address.as_str())
            .collect();

        for fip in self.dst.network.list_floating_ips().await? {
            if !target_networks.contains(&fip.floating_network_id) {
                continue;
            }
            if claimed.contains(fip.floating_ip_address.as_str()) {
                continue;
            }
            self.dst.network.delete_floating_ip(&fip.id).await?;
            self.reporter
                .deleted(ResourceKind::FloatingIp, &fip.floating_ip_address);
        }
        Ok(())
    }

    async fn dst_networks(&self) -> Result<Vec<Canonical<NetworkSpec>>> {
        let networks = self.dst.network.list_networks().await?;
        let subnets = self.dst.network.list_subnets().await?;
        let mut out = Vec::with_capacity(networks.len());
        for net in &networks {
            out.push(crate::convert::network(self.dst.identity.as_ref(), &subnets, net).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::seal;
    use crate::memory::{CloudExport, FloatingPool, InMemoryCloud, Tenant};
    use crate::report::TracingReporter;
    use crate::testutil::{floating_ip_data, network_data};
    use crate::snapshot::SnapshotReader;
    use migrate_api::MigrationConfig;

    fn tenants() -> Vec<Tenant> {
        vec![
            Tenant {
                id: "dst-alice".to_string(),
                name: "alice".to_string(),
            },
            Tenant {
                id: "dst-bob".to_string(),
                name: "bob".to_string(),
            },
        ]
    }

    /// Source snapshot: one floating IP on external network `extA` owned
    /// by alice.
    fn source_records() -> (Vec<Canonical<FloatingIpSpec>>, Vec<Canonical<NetworkSpec>>) {
        let networks = vec![seal(
            "src-ext",
            migrate_api::canonical::NetworkSpec {
                name: "extA".to_string(),
                admin_state_up: true,
                shared: false,
                tenant_name: "alice".to_string(),
                subnet_names: vec![],
                external: true,
                physical_network: None,
                network_type: None,
                segmentation_id: None,
            },
        )];
        let floats = vec![seal(
            "src-fip",
            FloatingIpSpec {
                tenant_name: "alice".to_string(),
                floating_network_id: "src-ext".to_string(),
                network_name: "extA".to_string(),
                ext_net_tenant_name: "alice".to_string(),
                fixed_ip_address: None,
                floating_ip_address: "203.0.113.5".to_string(),
            },
        )];
        (floats, networks)
    }

    fn destination() -> Arc<InMemoryCloud> {
        // destination twin of extA, alice-owned, with a /29 pool that
        // contains 203.0.113.5
        let mut ext = network_data("dst-ext", "extA", "dst-alice", true);
        ext.physical_network = None;
        ext.network_type = None;
        InMemoryCloud::new(CloudExport {
            tenants: tenants(),
            networks: vec![ext],
            floating_pools: vec![FloatingPool {
                network_id: "dst-ext".to_string(),
                cidr: "203.0.113.0/29".to_string(),
            }],
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_address_is_retagged_to_source_tenant() {
        let cloud = destination();
        // bob got to the address first
        {
            let handle = cloud.handle();
            loop {
                match handle
                    .network
                    .allocate_floating_ip("dst-ext", Some("dst-bob"))
                    .await
                    .unwrap()
                {
                    FloatingIpAllocation::Allocated(f) => {
                        if f.floating_ip_address == "203.0.113.5" {
                            break;
                        }
                    }
                    FloatingIpAllocation::Exhausted => panic!("pool too small for fixture"),
                }
            }
        }

        let handle = cloud.handle();
        let (floats, networks) = source_records();
        let reallocator = FloatingIpReallocator::new(&handle, Arc::new(TracingReporter));
        let outcome = reallocator.run(&floats, &networks).await.unwrap();
        assert_eq!(outcome.created_count(), 1);

        let state = cloud.export().await;
        let kept: Vec<_> = state
            .floating_ips
            .iter()
            .filter(|f| f.floating_network_id == "dst-ext")
            .collect();
        // prune leaves exactly the claimed address, under alice
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].floating_ip_address, "203.0.113.5");
        assert_eq!(kept[0].tenant_id, "dst-alice");
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let cloud = destination();
        let handle = cloud.handle();
        let (floats, networks) = source_records();

        let reallocator = FloatingIpReallocator::new(&handle, Arc::new(TracingReporter));
        let first = reallocator.run(&floats, &networks).await.unwrap();
        let second = reallocator.run(&floats, &networks).await.unwrap();

        // first run allocates then keeps the alice-owned address; the
        // second run changes nothing
        assert_eq!(second.created_count(), 0);
        assert_eq!(second.skipped, first.skipped + first.created_count());

        let state = cloud.export().await;
        assert_eq!(state.floating_ips.len(), 1);
        assert_eq!(state.floating_ips[0].tenant_id, "dst-alice");
    }

    #[tokio::test]
    async fn test_unclaimed_addresses_are_pruned() {
        let cloud = destination();
        let handle = cloud.handle();
        let (floats, networks) = source_records();

        let reallocator = FloatingIpReallocator::new(&handle, Arc::new(TracingReporter));
        reallocator.run(&floats, &networks).await.unwrap();

        let state = cloud.export().await;
        // /29 holds six usable addresses; only the claimed one survives
        assert_eq!(state.floating_ips.len(), 1);
        assert_eq!(state.floating_ips[0].floating_ip_address, "203.0.113.5");
    }

    #[tokio::test]
    async fn test_source_address_outside_pool_is_skipped() {
        let cloud = destination();
        let handle = cloud.handle();
        let (mut floats, networks) = source_records();
        floats.push(seal(
            "src-fip-2",
            FloatingIpSpec {
                tenant_name: "alice".to_string(),
                floating_network_id: "src-ext".to_string(),
                network_name: "extA".to_string(),
                ext_net_tenant_name: "alice".to_string(),
                fixed_ip_address: None,
                floating_ip_address: "198.51.100.9".to_string(),
            },
        ));

        let reallocator = FloatingIpReallocator::new(&handle, Arc::new(TracingReporter));
        let outcome = reallocator.run(&floats, &networks).await.unwrap();
        // both addresses skip: one already owned, one outside the pool
        assert_eq!(outcome.created_count(), 0);
        assert_eq!(outcome.skipped, 2);

        let state = cloud.export().await;
        assert_eq!(state.floating_ips.len(), 1);
        assert_eq!(state.floating_ips[0].floating_ip_address, "203.0.113.5");
    }

    #[tokio::test]
    async fn test_snapshot_source_floats_resolve_against_live_read() {
        // source floats read through the snapshot reader resolve the same
        // way hand-built records do
        let mut ext = network_data("src-ext", "extA", "dst-alice", true);
        ext.physical_network = None;
        ext.network_type = None;
        let source = InMemoryCloud::new(CloudExport {
            tenants: tenants(),
            networks: vec![ext],
            floating_ips: vec![floating_ip_data(
                "src-fip",
                "dst-alice",
                "src-ext",
                "203.0.113.5",
            )],
            ..Default::default()
        });
        let src_handle = source.handle();
        let config = MigrationConfig::default();
        let snapshot = SnapshotReader::new(&src_handle, &config).read().await.unwrap();

        let cloud = destination();
        let handle = cloud.handle();
        let reallocator = FloatingIpReallocator::new(&handle, Arc::new(TracingReporter));
        let outcome = reallocator
            .run(&snapshot.floating_ips, &snapshot.networks)
            .await
            .unwrap();
        assert_eq!(outcome.created_count() + outcome.skipped, 1);
    }
}
