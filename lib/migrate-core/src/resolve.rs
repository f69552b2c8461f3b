//! Cross-reference resolution.
//!
//! A foreign key read from the source cloud is meaningless at the
//! destination. Translation goes through identity: source id → identity
//! hash (via the source records of the referenced kind) → destination
//! record with the same hash → destination id. A miss at either step is a
//! typed `NotFound`; an unresolved reference must never flow silently into
//! a creation payload.

use crate::error::MigrateError;
use crate::Result;
use migrate_api::canonical::{Canonical, IdentityHash};

/// Identity hash of the source record carrying `native_id`.
pub fn hash_by_id<'a, T>(
    records: &'a [Canonical<T>],
    native_id: &str,
    what: &'static str,
) -> Result<&'a IdentityHash> {
    records
        .iter()
        .find(|r| r.native_id == native_id)
        .map(|r| &r.identity_hash)
        .ok_or_else(|| MigrateError::not_found(what, native_id))
}

/// Destination record whose content matches `hash`.
pub fn find_by_hash<'a, T>(
    records: &'a [Canonical<T>],
    hash: &IdentityHash,
    what: &'static str,
) -> Result<&'a Canonical<T>> {
    records
        .iter()
        .find(|r| &r.identity_hash == hash)
        .ok_or_else(|| MigrateError::not_found(what, hash.as_str()))
}

/// Full translation: source-space id to destination-space id.
pub fn dest_id<'a, T, U>(
    source_records: &[Canonical<T>],
    dest_records: &'a [Canonical<U>],
    source_id: &str,
    what: &'static str,
) -> Result<&'a str> {
    let hash = hash_by_id(source_records, source_id, what)?;
    let dest = find_by_hash(dest_records, hash, what)?;
    Ok(dest.native_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::seal;
    use migrate_api::canonical::LbMonitorSpec;

    fn monitor(native_id: &str, delay: u32) -> Canonical<LbMonitorSpec> {
        seal(
            native_id,
            LbMonitorSpec {
                tenant_name: "admin".to_string(),
                monitor_type: "TCP".to_string(),
                delay,
                timeout: 3,
                max_retries: 2,
            },
        )
    }

    #[test]
    fn test_dest_id_translates_through_identity() {
        let source = vec![monitor("src-a", 5), monitor("src-b", 10)];
        let dest = vec![monitor("dst-b", 10), monitor("dst-a", 5)];

        assert_eq!(dest_id(&source, &dest, "src-a", "monitor").unwrap(), "dst-a");
        assert_eq!(dest_id(&source, &dest, "src-b", "monitor").unwrap(), "dst-b");
    }

    #[test]
    fn test_source_miss_is_not_found() {
        let source = vec![monitor("src-a", 5)];
        let dest = vec![monitor("dst-a", 5)];

        let err = dest_id(&source, &dest, "src-gone", "monitor").unwrap_err();
        assert!(matches!(err, MigrateError::NotFound { .. }));
    }

    #[test]
    fn test_dest_miss_is_not_found() {
        let source = vec![monitor("src-a", 5)];
        let dest = vec![monitor("dst-b", 10)];

        let err = dest_id(&source, &dest, "src-a", "monitor").unwrap_err();
        assert!(matches!(err, MigrateError::NotFound { .. }));
    }
}
