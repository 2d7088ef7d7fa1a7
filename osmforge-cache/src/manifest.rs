//! Cache manifest — the durable record of one cache entry.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use osmforge_core::config::ModuleSelection;
use osmforge_core::errors::CacheError;

use crate::canonical::module_selection_hash;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// What kind of input an artifact preserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactType {
    Model,
    Profile,
    Configuration,
    Dmm,
}

/// One cached input file with its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheArtifact {
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    pub relative_path: String,
    pub content_hash: String,
}

/// Module selection block of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestModuleSelection {
    pub include_system: bool,
    pub include_inactive: bool,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules_hash: Option<String>,
    pub modules: Vec<String>,
}

impl ManifestModuleSelection {
    pub fn from_selection(selection: &ModuleSelection) -> Self {
        let modules = selection.sorted_names();
        Self {
            include_system: selection.include_system,
            include_inactive: selection.include_inactive,
            count: modules.len(),
            modules_hash: Some(module_selection_hash(selection)),
            modules,
        }
    }
}

/// The manifest persisted at `root/<key>/manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheManifest {
    pub version: u32,
    pub key: String,
    pub command: String,
    pub created_at_utc: DateTime<Utc>,
    pub last_validated_at_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_utc: Option<DateTime<Utc>>,
    pub module_selection: ManifestModuleSelection,
    pub metadata: BTreeMap<String, String>,
    pub artifacts: Vec<CacheArtifact>,
}

impl CacheManifest {
    /// Read a manifest from an entry directory. `Ok(None)` when absent.
    pub fn load(entry_dir: &Path) -> Result<Option<Self>, CacheError> {
        let path = entry_dir.join(MANIFEST_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|source| CacheError::ManifestIo {
            path: path.clone(),
            source,
        })?;
        let manifest = serde_json::from_str(&text).map_err(|e| CacheError::ManifestIo {
            path,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        Ok(Some(manifest))
    }

    /// Write the manifest into an entry directory.
    pub fn save(&self, entry_dir: &Path) -> Result<(), CacheError> {
        let path = entry_dir.join(MANIFEST_FILE_NAME);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::ManifestIo {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        std::fs::write(&path, json).map_err(|source| CacheError::ManifestIo { path, source })
    }
}
