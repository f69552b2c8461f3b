use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of resource kinds the reconciler understands.
///
/// The reconciliation pass walks kinds in the order they are declared here;
/// a child kind never precedes the kind it references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Network,
    Subnet,
    Router,
    FloatingIp,
    SecurityGroup,
    SecurityGroupRule,
    LbPool,
    LbMonitor,
    LbMember,
    LbVip,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Network => "network",
            ResourceKind::Subnet => "subnet",
            ResourceKind::Router => "router",
            ResourceKind::FloatingIp => "floating_ip",
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::SecurityGroupRule => "security_group_rule",
            ResourceKind::LbPool => "lb_pool",
            ResourceKind::LbMonitor => "lb_monitor",
            ResourceKind::LbMember => "lb_member",
            ResourceKind::LbVip => "lb_vip",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
