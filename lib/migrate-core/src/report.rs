//! Run-scoped progress reporting.
//!
//! The reconciler never logs through a global sink directly; it is handed a
//! reporter for the duration of one run so callers can capture, redirect, or
//! silence the stream.

use migrate_api::ResourceKind;
use tracing::info;

/// Observer for per-record reconciliation outcomes.
pub trait Reporter: Send + Sync {
    /// A record was created at the destination.
    fn created(&self, kind: ResourceKind, name: &str, dest_id: &str);

    /// A record was left alone, with the reason.
    fn skipped(&self, kind: ResourceKind, name: &str, reason: &str);

    /// A destination-only record was removed (floating-IP prune).
    fn deleted(&self, kind: ResourceKind, name: &str);
}

/// Default reporter: forwards to `tracing`.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn created(&self, kind: ResourceKind, name: &str, dest_id: &str) {
        info!(kind = %kind, name, dest_id, "created");
    }

    fn skipped(&self, kind: ResourceKind, name: &str, reason: &str) {
        info!(kind = %kind, name, reason, "skipped");
    }

    fn deleted(&self, kind: ResourceKind, name: &str) {
        info!(kind = %kind, name, "deleted");
    }
}
