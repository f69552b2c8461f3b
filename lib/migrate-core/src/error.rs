use migrate_api::ResourceKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Error, Debug)]
pub enum MigrateError {
    /// A referenced resource, tenant, or cross-reference match is missing.
    /// Always fatal for the current record; never degraded to an absent
    /// value in a creation payload.
    #[error("{what} not found: {reference}")]
    NotFound {
        what: &'static str,
        reference: String,
    },

    /// A control-plane call failed for any reason other than a missing
    /// resource. Fatal for the run; retries belong to the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Context wrapper naming the kind whose upsert failed.
    #[error("reconciling {kind}: {source}")]
    Reconcile {
        kind: ResourceKind,
        #[source]
        source: Box<MigrateError>,
    },
}

impl MigrateError {
    pub fn not_found(what: &'static str, reference: impl Into<String>) -> Self {
        MigrateError::NotFound {
            what,
            reference: reference.into(),
        }
    }

    pub fn in_kind(self, kind: ResourceKind) -> Self {
        MigrateError::Reconcile {
            kind,
            source: Box::new(self),
        }
    }
}
