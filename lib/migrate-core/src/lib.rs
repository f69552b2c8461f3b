//! Content-addressed, dependency-ordered resource reconciliation
//!
//! This library provides:
//! - Identity hashing over curated, cloud-portable field subsets
//! - Conversion of native records into canonical records
//! - Snapshot reading of a whole cloud's topology
//! - Cross-reference resolution from source ids to destination ids
//! - The per-kind reconciler and the floating-IP reallocator
//! - An in-memory control plane for rehearsal runs and tests

pub mod cloud;
pub mod convert;
pub mod error;
pub mod floating;
pub mod hash;
pub mod memory;
pub mod reconcile;
pub mod report;
pub mod resolve;
pub mod snapshot;

#[cfg(test)]
mod testutil;

pub use cloud::{CloudHandle, FloatingIpAllocation, IdentityApi, NetworkApi};
pub use error::{MigrateError, Result};
pub use memory::InMemoryCloud;
pub use reconcile::{KindOutcome, Reconciler, RunSummary};
pub use report::{Reporter, TracingReporter};
pub use snapshot::{Snapshot, SnapshotReader};
