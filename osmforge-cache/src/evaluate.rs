//! Entry evaluation — why an existing entry can or cannot be reused.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::manifest::{CacheArtifact, CacheManifest, ManifestModuleSelection};

/// Why an entry was rebuilt. `None` means the entry was reusable.
/// A missing manifest and an elapsed TTL are distinct reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    None,
    ManifestMissing,
    ManifestExpired,
    RefreshRequested,
    MetadataMismatch,
    ModuleSelectionChanged,
    ContentHashMismatch,
}

impl InvalidationReason {
    /// The stable string recorded under the `reason` metadata key.
    pub fn as_metadata_str(&self) -> &'static str {
        match self {
            Self::None => "cache.reused",
            Self::ManifestMissing => "manifest.missing",
            Self::ManifestExpired => "ttl.elapsed",
            Self::RefreshRequested => "refresh.requested",
            Self::MetadataMismatch => "metadata.mismatch",
            Self::ModuleSelectionChanged => "module.selection.changed",
            Self::ContentHashMismatch => "content.hash.mismatch",
        }
    }

    pub fn invalidates(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Decide whether an entry can be reused for the incoming request.
pub fn evaluate(
    manifest: Option<&CacheManifest>,
    refresh_requested: bool,
    now: DateTime<Utc>,
    expected_metadata: &BTreeMap<String, String>,
    expected_selection: &ManifestModuleSelection,
    expected_artifacts: &[CacheArtifact],
) -> InvalidationReason {
    let Some(manifest) = manifest else {
        return InvalidationReason::ManifestMissing;
    };
    if let Some(expires) = manifest.expires_at_utc {
        if expires < now {
            return InvalidationReason::ManifestExpired;
        }
    }
    if refresh_requested {
        return InvalidationReason::RefreshRequested;
    }
    if manifest.metadata != *expected_metadata {
        return InvalidationReason::MetadataMismatch;
    }
    if manifest.module_selection != *expected_selection {
        return InvalidationReason::ModuleSelectionChanged;
    }
    if manifest.artifacts != expected_artifacts {
        return InvalidationReason::ContentHashMismatch;
    }
    InvalidationReason::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn manifest(expires: Option<DateTime<Utc>>) -> CacheManifest {
        CacheManifest {
            version: 1,
            key: "k".to_string(),
            command: "build-ssdt".to_string(),
            created_at_utc: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            last_validated_at_utc: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            expires_at_utc: expires,
            module_selection: ManifestModuleSelection {
                include_system: false,
                include_inactive: false,
                count: 0,
                modules_hash: None,
                modules: vec![],
            },
            metadata: BTreeMap::new(),
            artifacts: vec![],
        }
    }

    #[test]
    fn missing_manifest_is_not_reported_as_expired() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let selection = manifest(None).module_selection.clone();
        let reason = evaluate(None, false, now, &BTreeMap::new(), &selection, &[]);
        assert_eq!(reason, InvalidationReason::ManifestMissing);
        assert_eq!(reason.as_metadata_str(), "manifest.missing");
    }

    #[test]
    fn elapsed_ttl_reports_ttl_elapsed() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let expired = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let m = manifest(Some(expired));
        let selection = m.module_selection.clone();
        let reason = evaluate(Some(&m), false, now, &BTreeMap::new(), &selection, &[]);
        assert_eq!(reason, InvalidationReason::ManifestExpired);
        assert_eq!(reason.as_metadata_str(), "ttl.elapsed");
    }

    #[test]
    fn matching_entry_reuses() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let m = manifest(None);
        let selection = m.module_selection.clone();
        let reason = evaluate(Some(&m), false, now, &BTreeMap::new(), &selection, &[]);
        assert_eq!(reason, InvalidationReason::None);
        assert!(!reason.invalidates());
    }

    #[test]
    fn metadata_change_invalidates() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let m = manifest(None);
        let selection = m.module_selection.clone();
        let mut metadata = BTreeMap::new();
        metadata.insert("policy.mode".to_string(), "Aggressive".to_string());
        let reason = evaluate(Some(&m), false, now, &metadata, &selection, &[]);
        assert_eq!(reason, InvalidationReason::MetadataMismatch);
    }
}
