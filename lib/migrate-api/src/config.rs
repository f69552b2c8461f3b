//! Migration run configuration.

use serde::{Deserialize, Serialize};

/// Options recognized by one reconciliation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Reproduce source floating IPs at the destination
    #[serde(default = "default_true")]
    pub keep_floatingip: bool,

    /// Reconcile the load-balancer chain (pools, monitors, members, VIPs)
    #[serde(default)]
    pub keep_lbaas: bool,

    /// Reconcile resources of every tenant instead of a single one
    #[serde(default = "default_true")]
    pub all_networks: bool,

    /// Include externally-flagged networks, their subnets, and router
    /// gateways in the create pass
    #[serde(default = "default_true")]
    pub migrate_extnets: bool,

    /// Tenant to migrate when `all_networks` is off
    #[serde(default)]
    pub tenant: Option<String>,
}

impl MigrationConfig {
    /// The tenant restriction in effect, if any.
    pub fn tenant_filter(&self) -> Option<&str> {
        if self.all_networks {
            None
        } else {
            self.tenant.as_deref()
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            keep_floatingip: true,
            keep_lbaas: false,
            all_networks: true,
            migrate_extnets: true,
            tenant: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: MigrationConfig = serde_json::from_str("{}").unwrap();
        assert!(config.keep_floatingip);
        assert!(!config.keep_lbaas);
        assert!(config.all_networks);
        assert!(config.migrate_extnets);
        assert!(config.tenant_filter().is_none());
    }

    #[test]
    fn test_tenant_filter_requires_all_networks_off() {
        let config = MigrationConfig {
            all_networks: false,
            tenant: Some("admin".to_string()),
            ..Default::default()
        };
        assert_eq!(config.tenant_filter(), Some("admin"));

        let config = MigrationConfig {
            tenant: Some("admin".to_string()),
            ..Default::default()
        };
        assert_eq!(config.tenant_filter(), None);
    }
}
