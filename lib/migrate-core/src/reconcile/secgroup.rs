//! Security group and rule upsert.

use super::{KindOutcome, Reconciler};
use crate::resolve;
use crate::snapshot::Snapshot;
use crate::Result;
use migrate_api::payload::{SecurityGroupCreate, SecurityGroupRuleCreate};
use migrate_api::ResourceKind;
use std::collections::HashSet;

/// Every tenant already owns a group by this name; it is never recreated.
const DEFAULT_GROUP: &str = "default";

impl Reconciler<'_> {
    pub(super) async fn reconcile_security_groups(
        &self,
        snapshot: &Snapshot,
    ) -> Result<KindOutcome> {
        let existing = self.dst_security_groups().await?;
        let index: HashSet<_> = existing.iter().map(|g| &g.identity_hash).collect();
        let mut outcome = KindOutcome::default();

        for group in &snapshot.security_groups {
            if group.spec.name == DEFAULT_GROUP {
                self.reporter.skipped(
                    ResourceKind::SecurityGroup,
                    &group.spec.name,
                    "default group exists in every tenant",
                );
                outcome.record_skipped();
                continue;
            }
            if index.contains(&group.identity_hash) {
                self.reporter.skipped(
                    ResourceKind::SecurityGroup,
                    &group.spec.name,
                    "destination already has a group with this identity",
                );
                outcome.record_skipped();
                continue;
            }

            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&group.spec.tenant_name)
                .await?;
            let payload = SecurityGroupCreate {
                name: group.spec.name.clone(),
                tenant_id,
                description: group.spec.description.clone(),
            };

            let created = self.dst.network.create_security_group(&payload).await?;
            self.reporter
                .created(ResourceKind::SecurityGroup, &group.spec.name, &created.id);
            outcome.record_created(&group.native_id, &created.id, &group.spec.name);
        }

        Ok(outcome)
    }

    /// Rules run as their own pass so every destination group — including
    /// the pre-existing default groups — is visible by then.
    pub(super) async fn reconcile_security_group_rules(
        &self,
        snapshot: &Snapshot,
    ) -> Result<KindOutcome> {
        let existing = self.dst_security_groups().await?;
        let mut outcome = KindOutcome::default();

        for group in &snapshot.security_groups {
            let dst_group =
                resolve::find_by_hash(&existing, &group.identity_hash, "security group")?;
            let dst_rule_hashes: HashSet<_> =
                dst_group.spec.rules.iter().map(|r| &r.identity_hash).collect();
            let tenant_id = self
                .dst
                .identity
                .tenant_id_by_name(&dst_group.spec.tenant_name)
                .await?;

            for rule in &group.spec.rules {
                let Some(protocol) = rule.spec.protocol.clone() else {
                    // placeholder rules the provider seeds groups with
                    outcome.record_skipped();
                    continue;
                };
                if dst_rule_hashes.contains(&rule.identity_hash) {
                    self.reporter.skipped(
                        ResourceKind::SecurityGroupRule,
                        &group.spec.name,
                        "destination group already has a rule with this identity",
                    );
                    outcome.record_skipped();
                    continue;
                }

                // a group-scoped rule points at its peer through the same
                // hash indirection, against the sibling source groups
                let remote_group_id = match &rule.spec.remote_group_id {
                    Some(remote_id) => Some(
                        resolve::dest_id(
                            &snapshot.security_groups,
                            &existing,
                            remote_id,
                            "remote security group",
                        )?
                        .to_string(),
                    ),
                    None => None,
                };

                let payload = SecurityGroupRuleCreate {
                    direction: rule.spec.direction.clone(),
                    protocol,
                    port_range_min: rule.spec.port_range_min,
                    port_range_max: rule.spec.port_range_max,
                    ethertype: rule.spec.ethertype.clone(),
                    remote_ip_prefix: rule.spec.remote_ip_prefix.clone(),
                    remote_group_id,
                    security_group_id: dst_group.native_id.clone(),
                    tenant_id: tenant_id.clone(),
                };

                let created = self.dst.network.create_security_group_rule(&payload).await?;
                self.reporter
                    .created(ResourceKind::SecurityGroupRule, &group.spec.name, &created.id);
                outcome.record_created(&rule.native_id, &created.id, &group.spec.name);
            }
        }

        Ok(outcome)
    }
}
