//! Identity hashing over curated field subsets.
//!
//! The hash is the cross-cloud primary key substitute: identical semantic
//! content yields an identical hash no matter which cloud produced the
//! record, how list elements were ordered, or how strings were cased.
//! The field subset per kind is fixed policy; it excludes every
//! cloud-local id and keeps only attributes both clouds can agree on.

use migrate_api::canonical::{
    Canonical, FloatingIpSpec, IdentityHash, LbMemberSpec, LbMonitorSpec, LbPoolSpec, LbVipSpec,
    NetworkSpec, RouterSpec, SecurityGroupRuleSpec, SecurityGroupSpec, SubnetSpec,
};
use migrate_api::ResourceKind;
use sha2::{Digest, Sha256};

/// One value participating in an identity hash.
#[derive(Clone, Debug)]
pub enum HashInput {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<HashInput>),
}

impl From<&str> for HashInput {
    fn from(value: &str) -> Self {
        HashInput::Str(value.to_string())
    }
}

impl From<&String> for HashInput {
    fn from(value: &String) -> Self {
        HashInput::Str(value.clone())
    }
}

impl From<bool> for HashInput {
    fn from(value: bool) -> Self {
        HashInput::Bool(value)
    }
}

impl From<u16> for HashInput {
    fn from(value: u16) -> Self {
        HashInput::Int(i64::from(value))
    }
}

impl From<u32> for HashInput {
    fn from(value: u32) -> Self {
        HashInput::Int(i64::from(value))
    }
}

impl HashInput {
    pub fn opt<T: Into<HashInput>>(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HashInput::Null)
    }
}

/// Render a value into its canonical scalar forms. Lists flatten into
/// their elements; strings lose their case. Type tags keep `1`, `"1"` and
/// `true` from colliding.
fn flatten(input: &HashInput, out: &mut Vec<String>) {
    match input {
        HashInput::Null => out.push("~".to_string()),
        HashInput::Bool(b) => out.push(format!("b:{b}")),
        HashInput::Int(i) => out.push(format!("i:{i}")),
        HashInput::Str(s) => out.push(format!("s:{}", s.to_lowercase())),
        HashInput::List(items) => {
            for item in items {
                flatten(item, out);
            }
        }
    }
}

/// Hash a curated field list: flatten, sort, digest.
pub fn identity_hash(fields: &[HashInput]) -> IdentityHash {
    let mut parts = Vec::new();
    for field in fields {
        flatten(field, &mut parts);
    }
    parts.sort();

    let mut hasher = Sha256::new();
    for part in &parts {
        hasher.update(part.as_bytes());
        // NUL separator so adjacent parts cannot run together
        hasher.update([0u8]);
    }
    IdentityHash::new(hex::encode(hasher.finalize()))
}

/// The curated identity field subset of one canonical spec kind.
pub trait Identity {
    const KIND: ResourceKind;

    fn identity_fields(&self) -> Vec<HashInput>;
}

/// Wrap a spec into a canonical record, computing its identity hash.
pub fn seal<T: Identity>(native_id: impl Into<String>, spec: T) -> Canonical<T> {
    let identity_hash = identity_hash(&spec.identity_fields());
    Canonical {
        native_id: native_id.into(),
        identity_hash,
        spec,
    }
}

impl Identity for NetworkSpec {
    const KIND: ResourceKind = ResourceKind::Network;

    fn identity_fields(&self) -> Vec<HashInput> {
        vec![
            (&self.name).into(),
            self.shared.into(),
            (&self.tenant_name).into(),
            self.external.into(),
        ]
    }
}

impl Identity for SubnetSpec {
    const KIND: ResourceKind = ResourceKind::Subnet;

    fn identity_fields(&self) -> Vec<HashInput> {
        let pools = self
            .allocation_pools
            .iter()
            .flat_map(|p| [(&p.start).into(), (&p.end).into()])
            .collect();
        vec![
            (&self.name).into(),
            self.enable_dhcp.into(),
            HashInput::List(pools),
            HashInput::opt(self.gateway_ip.as_ref()),
            (&self.cidr).into(),
            (&self.tenant_name).into(),
        ]
    }
}

impl Identity for RouterSpec {
    const KIND: ResourceKind = ResourceKind::Router;

    fn identity_fields(&self) -> Vec<HashInput> {
        let routes = self
            .routes
            .iter()
            .flat_map(|r| [(&r.destination).into(), (&r.nexthop).into()])
            .collect();
        vec![
            (&self.name).into(),
            HashInput::List(routes),
            (&self.tenant_name).into(),
        ]
    }
}

impl Identity for FloatingIpSpec {
    const KIND: ResourceKind = ResourceKind::FloatingIp;

    fn identity_fields(&self) -> Vec<HashInput> {
        vec![
            (&self.floating_ip_address).into(),
            (&self.network_name).into(),
            (&self.tenant_name).into(),
        ]
    }
}

impl Identity for SecurityGroupSpec {
    const KIND: ResourceKind = ResourceKind::SecurityGroup;

    fn identity_fields(&self) -> Vec<HashInput> {
        vec![
            (&self.name).into(),
            (&self.tenant_name).into(),
            (&self.description).into(),
        ]
    }
}

impl Identity for SecurityGroupRuleSpec {
    const KIND: ResourceKind = ResourceKind::SecurityGroupRule;

    // The owning group is deliberately absent: a rule's identity is
    // comparable across groups and clouds.
    fn identity_fields(&self) -> Vec<HashInput> {
        vec![
            (&self.direction).into(),
            HashInput::opt(self.remote_ip_prefix.as_ref()),
            HashInput::opt(self.protocol.as_ref()),
            HashInput::opt(self.port_range_min),
            HashInput::opt(self.port_range_max),
            (&self.ethertype).into(),
        ]
    }
}

impl Identity for LbPoolSpec {
    const KIND: ResourceKind = ResourceKind::LbPool;

    fn identity_fields(&self) -> Vec<HashInput> {
        vec![
            (&self.lb_method).into(),
            (&self.protocol).into(),
            HashInput::opt(self.provider.as_ref()),
        ]
    }
}

impl Identity for LbMonitorSpec {
    const KIND: ResourceKind = ResourceKind::LbMonitor;

    fn identity_fields(&self) -> Vec<HashInput> {
        vec![
            (&self.monitor_type).into(),
            self.delay.into(),
            self.timeout.into(),
            self.max_retries.into(),
        ]
    }
}

impl Identity for LbMemberSpec {
    const KIND: ResourceKind = ResourceKind::LbMember;

    fn identity_fields(&self) -> Vec<HashInput> {
        vec![
            (&self.address).into(),
            self.protocol_port.into(),
            self.weight.into(),
            (&self.tenant_name).into(),
        ]
    }
}

impl Identity for LbVipSpec {
    const KIND: ResourceKind = ResourceKind::LbVip;

    fn identity_fields(&self) -> Vec<HashInput> {
        vec![
            (&self.name).into(),
            (&self.address).into(),
            (&self.protocol).into(),
            self.protocol_port.into(),
            (&self.tenant_name).into(),
        ]
    }
}
