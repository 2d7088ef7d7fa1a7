//! Toggle registry — effective value and provenance per configuration knob.

use serde::{Deserialize, Serialize};

/// Where a toggle's effective value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleSource {
    Default,
    Configuration,
    Override,
}

impl ToggleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Configuration => "configuration",
            Self::Override => "override",
        }
    }
}

/// One resolved knob: stable key, rendered value, provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
    pub key: String,
    pub value: String,
    pub source: ToggleSource,
}

impl Toggle {
    pub fn new(key: impl Into<String>, value: impl Into<String>, source: ToggleSource) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source,
        }
    }
}

/// Ordered snapshot of every knob the tightening run saw.
/// Decision rationales reference entries by `key`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TighteningToggleSnapshot {
    pub entries: Vec<Toggle>,
}

impl TighteningToggleSnapshot {
    pub fn get(&self, key: &str) -> Option<&Toggle> {
        self.entries.iter().find(|t| t.key == key)
    }

    /// Renders `key=value` for rationale strings.
    pub fn describe(&self, key: &str) -> String {
        match self.get(key) {
            Some(t) => format!("{}={}", t.key, t.value),
            None => format!("{key}=<unset>"),
        }
    }
}

// Stable toggle keys.
pub const TOGGLE_POLICY_MODE: &str = "policy.mode";
pub const TOGGLE_POLICY_NULL_BUDGET: &str = "policy.nullBudget";
pub const TOGGLE_POLICY_COMPOSITE_UNIQUE: &str = "policy.enforceCompositeUnique";
pub const TOGGLE_EMISSION_PER_TABLE_FILES: &str = "emission.perTableFiles";
pub const TOGGLE_EMISSION_MODULE_PARALLELISM: &str = "emission.moduleParallelism";
pub const TOGGLE_EMISSION_GROUP_BY_MODULE: &str = "emission.groupByModule";
pub const TOGGLE_EMISSION_MASTER_FILE: &str = "emission.emitMasterFile";
pub const TOGGLE_EMISSION_SYNC_MODE: &str = "emission.synchronizationMode";
pub const TOGGLE_EMISSION_DYNAMIC_MODE: &str = "emission.dynamicInsertMode";
pub const TOGGLE_CACHE_REFRESH: &str = "cache.refresh";
pub const TOGGLE_CACHE_TTL_SECONDS: &str = "cache.ttlSeconds";
pub const TOGGLE_APPLY_ENABLED: &str = "apply.enabled";
