//! Emission options.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Seed script semantics against an existing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SynchronizationMode {
    /// MERGE: insert missing rows, update drifted ones, delete nothing.
    #[default]
    NonDestructive,
    /// INSERT guarded by existence checks; mismatches are left for review.
    ValidateThenApply,
    /// TRUNCATE then INSERT; the seed set is the source of truth.
    Authoritative,
}

impl SynchronizationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonDestructive => "NonDestructive",
            Self::ValidateThenApply => "ValidateThenApply",
            Self::Authoritative => "Authoritative",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "nondestructive" => Some(Self::NonDestructive),
            "validatethenapply" => Some(Self::ValidateThenApply),
            "authoritative" => Some(Self::Authoritative),
            _ => None,
        }
    }
}

/// Output mode for dynamic entity inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DynamicInsertOutputMode {
    #[default]
    Disabled,
    PerEntity,
    SingleFile,
}

impl DynamicInsertOutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::PerEntity => "PerEntity",
            Self::SingleFile => "SingleFile",
        }
    }
}

/// Options controlling artifact materialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionOptions {
    /// Per-table layout (`Tables/<schema>/<table>.sql`) instead of
    /// module-qualified single files (`Modules/<module>.<entity>.sql`).
    pub per_table_files: bool,
    /// Fan-out degree for table emission and SQL validation. 0 = unbounded.
    pub module_parallelism: usize,
    /// Replace non-alphanumerics in module folder names.
    pub sanitize_module_names: bool,
    /// One seed file per module.
    pub group_by_module: bool,
    /// Additionally emit `BaselineSeeds/StaticEntities.seed.sql`.
    pub emit_master_file: bool,
    /// Seed script semantics.
    pub synchronization_mode: SynchronizationMode,
    /// Dynamic insert emission.
    pub dynamic_insert_mode: DynamicInsertOutputMode,
}

impl Default for EmissionOptions {
    fn default() -> Self {
        Self {
            per_table_files: false,
            module_parallelism: constants::DEFAULT_MODULE_PARALLELISM,
            sanitize_module_names: true,
            group_by_module: true,
            emit_master_file: false,
            synchronization_mode: SynchronizationMode::default(),
            dynamic_insert_mode: DynamicInsertOutputMode::default(),
        }
    }
}

impl EmissionOptions {
    /// Effective fan-out degree. 0 means "no limit" (all available threads).
    pub fn effective_parallelism(&self) -> Option<usize> {
        match self.module_parallelism {
            0 => None,
            n => Some(n),
        }
    }
}
