//! Evidence cache options.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options for the content-addressed evidence cache.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EvidenceCacheOptions {
    /// Root directory for cache entries.
    pub root: PathBuf,
    /// Force a rebuild even when the entry would be reusable.
    pub refresh: bool,
    /// Entry time-to-live in seconds. None disables expiry.
    pub ttl_seconds: Option<u64>,
    /// Retention: prune entries older than this many seconds.
    pub max_age_seconds: Option<u64>,
    /// Retention: keep at most this many entries.
    pub max_entries: Option<usize>,
}

impl EvidenceCacheOptions {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::from_secs)
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_seconds.map(Duration::from_secs)
    }
}
