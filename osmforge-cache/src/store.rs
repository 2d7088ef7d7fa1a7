//! The evidence cache service.
//!
//! One logical cache operation holds an advisory lock on the entry's
//! `.lock` file for the duration of the write. Reuse never rewrites
//! artifact bytes, so artifact timestamps survive across reused runs.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use osmforge_core::config::{EvidenceCacheOptions, ModuleSelection};
use osmforge_core::constants::CACHE_MANIFEST_VERSION;
use osmforge_core::errors::CacheError;

use crate::canonical::{canonicalize, content_hash, module_selection_hash, sha256_hex};
use crate::evaluate::{evaluate, InvalidationReason};
use crate::manifest::{
    ArtifactType, CacheArtifact, CacheManifest, ManifestModuleSelection,
};
use crate::retention::apply_retention;

const LOCK_FILE_NAME: &str = ".lock";

/// Inputs of one cache operation.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    /// The pipeline command this entry belongs to (e.g. `build-ssdt`).
    pub command: String,
    pub model_path: PathBuf,
    pub profile_path: Option<PathBuf>,
    pub dmm_path: Option<PathBuf>,
    /// Canonical configuration payload, when the run carries one.
    pub config_payload: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub selection: ModuleSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Created,
    Reused,
}

/// Result of one cache operation.
#[derive(Debug, Clone)]
pub struct CacheResult {
    pub outcome: CacheOutcome,
    pub key: String,
    pub cache_directory: PathBuf,
    pub manifest: CacheManifest,
    /// Evaluation metadata: `reason`, `evaluatedAtUtc`, `moduleSelection.hash`,
    /// `manifest.expiresAtUtc` when set, and `pruned.*` after retention.
    pub evaluation: BTreeMap<String, String>,
}

/// Content-addressed cache over a shared root directory.
pub struct EvidenceCacheService {
    options: EvidenceCacheOptions,
}

impl EvidenceCacheService {
    pub fn new(options: EvidenceCacheOptions) -> Self {
        Self { options }
    }

    /// Resolve or build the entry for a request at the current time.
    pub fn cache(&self, request: &CacheRequest) -> Result<CacheResult, CacheError> {
        self.cache_at(request, Utc::now())
    }

    /// Resolve or build the entry for a request at an explicit time.
    pub fn cache_at(
        &self,
        request: &CacheRequest,
        now: DateTime<Utc>,
    ) -> Result<CacheResult, CacheError> {
        if !request.model_path.exists() {
            return Err(CacheError::ModelNotFound {
                path: request.model_path.clone(),
            });
        }

        let inputs = read_inputs(request)?;
        let key = compute_key(request, &inputs);
        let entry_dir = self.options.root.join(&key);
        fs::create_dir_all(&entry_dir).map_err(|source| CacheError::ManifestIo {
            path: entry_dir.clone(),
            source,
        })?;

        let lock_path = entry_dir.join(LOCK_FILE_NAME);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| CacheError::LockFailed {
                path: lock_path.clone(),
                source,
            })?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.write().map_err(|source| CacheError::LockFailed {
            path: lock_path,
            source,
        })?;

        let expected_selection = ManifestModuleSelection::from_selection(&request.selection);
        let expected_artifacts = artifact_records(&inputs);
        let existing = CacheManifest::load(&entry_dir)?;
        let reason = evaluate(
            existing.as_ref(),
            self.options.refresh,
            now,
            &request.metadata,
            &expected_selection,
            &expected_artifacts,
        );

        let mut evaluation = BTreeMap::new();
        evaluation.insert(
            "reason".to_string(),
            reason.as_metadata_str().to_string(),
        );
        evaluation.insert("evaluatedAtUtc".to_string(), now.to_rfc3339());
        evaluation.insert(
            "moduleSelection.hash".to_string(),
            module_selection_hash(&request.selection),
        );

        let (outcome, manifest) = match existing {
            Some(mut manifest) if !reason.invalidates() => {
                tracing::debug!(key, "reusing cache entry");
                manifest.last_validated_at_utc = now;
                manifest.save(&entry_dir)?;
                (CacheOutcome::Reused, manifest)
            }
            _ => {
                tracing::info!(key, reason = reason.as_metadata_str(), "rebuilding cache entry");
                let manifest = self.build_entry(
                    &entry_dir,
                    &key,
                    request,
                    &inputs,
                    expected_selection,
                    expected_artifacts,
                    now,
                )?;
                (CacheOutcome::Created, manifest)
            }
        };

        if let Some(expires) = manifest.expires_at_utc {
            evaluation.insert("manifest.expiresAtUtc".to_string(), expires.to_rfc3339());
        }

        let retention = apply_retention(&self.options.root, &self.options, now)?;
        if retention.total() > 0 {
            evaluation.insert("pruned.total".to_string(), retention.total().to_string());
            evaluation.insert(
                "pruned.expired".to_string(),
                retention.expired.len().to_string(),
            );
            evaluation.insert(
                "pruned.capacity".to_string(),
                retention.capacity.len().to_string(),
            );
            evaluation.insert(
                "pruned.remaining".to_string(),
                retention.remaining.to_string(),
            );
            evaluation.insert(
                "pruned.entries".to_string(),
                retention.pruned_keys().join(","),
            );
        }

        Ok(CacheResult {
            outcome,
            key,
            cache_directory: entry_dir,
            manifest,
            evaluation,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_entry(
        &self,
        entry_dir: &Path,
        key: &str,
        request: &CacheRequest,
        inputs: &Inputs,
        selection: ManifestModuleSelection,
        artifacts: Vec<CacheArtifact>,
        now: DateTime<Utc>,
    ) -> Result<CacheManifest, CacheError> {
        for (artifact, bytes) in artifacts.iter().zip(inputs.payloads()) {
            let path = entry_dir.join(&artifact.relative_path);
            fs::write(&path, bytes).map_err(|source| CacheError::ManifestIo { path, source })?;
        }

        let expires_at_utc = self
            .options
            .ttl()
            .and_then(|ttl| Duration::from_std(ttl).ok())
            .map(|ttl| now + ttl);

        let manifest = CacheManifest {
            version: CACHE_MANIFEST_VERSION,
            key: key.to_string(),
            command: request.command.clone(),
            created_at_utc: now,
            last_validated_at_utc: now,
            expires_at_utc,
            module_selection: selection,
            metadata: request.metadata.clone(),
            artifacts,
        };
        manifest.save(entry_dir)?;
        Ok(manifest)
    }
}

struct Inputs {
    model: Vec<u8>,
    profile: Option<Vec<u8>>,
    dmm: Option<Vec<u8>>,
    config: Option<Vec<u8>>,
}

impl Inputs {
    fn payloads(&self) -> impl Iterator<Item = &Vec<u8>> {
        std::iter::once(&self.model)
            .chain(self.profile.iter())
            .chain(self.dmm.iter())
            .chain(self.config.iter())
    }
}

fn read_inputs(request: &CacheRequest) -> Result<Inputs, CacheError> {
    let read = |path: &Path| -> Result<Vec<u8>, CacheError> {
        let bytes = fs::read(path).map_err(|source| CacheError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(canonicalize(&bytes))
    };
    Ok(Inputs {
        model: read(&request.model_path)?,
        profile: request.profile_path.as_deref().map(read).transpose()?,
        dmm: request.dmm_path.as_deref().map(read).transpose()?,
        config: request
            .config_payload
            .as_deref()
            .map(|c| canonicalize(c.as_bytes())),
    })
}

fn artifact_records(inputs: &Inputs) -> Vec<CacheArtifact> {
    let mut artifacts = vec![CacheArtifact {
        artifact_type: ArtifactType::Model,
        relative_path: "model.json".to_string(),
        content_hash: content_hash(&inputs.model),
    }];
    if let Some(profile) = &inputs.profile {
        artifacts.push(CacheArtifact {
            artifact_type: ArtifactType::Profile,
            relative_path: "profile.json".to_string(),
            content_hash: content_hash(profile),
        });
    }
    if let Some(dmm) = &inputs.dmm {
        artifacts.push(CacheArtifact {
            artifact_type: ArtifactType::Dmm,
            relative_path: "dmm.json".to_string(),
            content_hash: content_hash(dmm),
        });
    }
    if let Some(config) = &inputs.config {
        artifacts.push(CacheArtifact {
            artifact_type: ArtifactType::Configuration,
            relative_path: "configuration.toml".to_string(),
            content_hash: content_hash(config),
        });
    }
    artifacts
}

/// Deterministic entry key: SHA-256 over the command and the canonical
/// input bytes. Metadata and module selection are deliberately excluded:
/// changing either must invalidate the existing entry in place
/// (`metadata.mismatch`, `module.selection.changed`) rather than fork a
/// fresh key that would always report `manifest.missing`.
fn compute_key(request: &CacheRequest, inputs: &Inputs) -> String {
    let mut payload = String::new();
    payload.push_str(&request.command);
    payload.push('\n');
    for bytes in inputs.payloads() {
        payload.push_str(&content_hash(bytes));
        payload.push('\n');
    }
    let full = sha256_hex(&payload);
    full[..32].to_string()
}
