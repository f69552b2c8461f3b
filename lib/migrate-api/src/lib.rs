//! Data model for cross-cloud topology migration
//!
//! This library provides:
//! - Native resource records as a control plane returns them
//! - Creation payloads for the destination control plane
//! - Canonical, cloud-agnostic resource specs tagged with identity hashes
//! - The migration run configuration

pub mod canonical;
pub mod config;
pub mod kind;
pub mod native;
pub mod payload;

pub use canonical::{Canonical, IdentityHash};
pub use config::MigrationConfig;
pub use kind::ResourceKind;
