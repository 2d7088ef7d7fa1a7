//! Retention — age and capacity pruning over the cache root.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use osmforge_core::config::EvidenceCacheOptions;
use osmforge_core::errors::CacheError;

use crate::manifest::CacheManifest;

/// What a pruning pass removed.
#[derive(Debug, Clone, Default)]
pub struct RetentionOutcome {
    pub expired: Vec<String>,
    pub capacity: Vec<String>,
    pub remaining: usize,
}

impl RetentionOutcome {
    pub fn total(&self) -> usize {
        self.expired.len() + self.capacity.len()
    }

    /// Removed entry keys, expired first, for the `pruned.entries` value.
    pub fn pruned_keys(&self) -> Vec<String> {
        let mut keys = self.expired.clone();
        keys.extend(self.capacity.iter().cloned());
        keys
    }
}

/// Apply the max-age policy, then the max-entries policy.
/// Entries without a readable manifest are left alone.
pub fn apply_retention(
    root: &Path,
    options: &EvidenceCacheOptions,
    now: DateTime<Utc>,
) -> Result<RetentionOutcome, CacheError> {
    let mut outcome = RetentionOutcome::default();
    if options.max_age_seconds.is_none() && options.max_entries.is_none() {
        return Ok(outcome);
    }

    let mut entries: Vec<(String, PathBuf, DateTime<Utc>)> = Vec::new();
    let read_dir = match std::fs::read_dir(root) {
        Ok(read_dir) => read_dir,
        Err(_) => return Ok(outcome),
    };
    for dir_entry in read_dir.flatten() {
        let path = dir_entry.path();
        if !path.is_dir() {
            continue;
        }
        let Ok(Some(manifest)) = CacheManifest::load(&path) else {
            continue;
        };
        let name = dir_entry.file_name().to_string_lossy().to_string();
        entries.push((name, path, manifest.last_validated_at_utc));
    }

    if let Some(max_age) = options.max_age() {
        let cutoff = now
            - chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::zero());
        entries.retain(|(name, path, last_validated)| {
            if *last_validated < cutoff {
                if remove_entry(root, path).is_ok() {
                    outcome.expired.push(name.clone());
                }
                false
            } else {
                true
            }
        });
    }

    if let Some(max_entries) = options.max_entries {
        if entries.len() > max_entries {
            // Most recently validated first; the tail gets evicted.
            entries.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
            for (name, path, _) in entries.split_off(max_entries) {
                if remove_entry(root, &path).is_ok() {
                    outcome.capacity.push(name);
                }
            }
        }
    }

    outcome.remaining = entries.len();
    Ok(outcome)
}

fn remove_entry(root: &Path, path: &Path) -> Result<(), CacheError> {
    std::fs::remove_dir_all(path).map_err(|source| CacheError::RetentionFailed {
        root: root.to_path_buf(),
        source,
    })
}
