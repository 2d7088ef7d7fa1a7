//! The build request and its external collaborators.

use std::path::PathBuf;

use osmforge_analysis::model::RelationshipConstraintMetadataProvider;
use osmforge_analysis::profile::DataProfiler;
use osmforge_core::config::{PipelineConfig, TighteningToggleSnapshot};
use osmforge_emit::providers::{DynamicEntityDataProvider, StaticEntityDataProvider};

/// One build-ssdt run request. Paths and resolved configuration only;
/// collaborators arrive separately so requests stay serializable.
#[derive(Debug, Clone)]
pub struct BuildSsdtRequest {
    pub model_path: PathBuf,
    /// Optional second model whose entities extend the primary.
    pub supplemental_model_path: Option<PathBuf>,
    /// Profile fixture. When absent the profiler collaborator captures live.
    pub profile_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub config: PipelineConfig,
    pub toggles: TighteningToggleSnapshot,
    /// Cache evidence under `config.cache.root` when set.
    pub use_evidence_cache: bool,
    /// Sort modules by name after ingestion.
    pub sort_modules: bool,
    /// Produce `telemetry.zip` from the run's key artifacts.
    pub package_telemetry: bool,
}

impl BuildSsdtRequest {
    pub fn new(model_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            supplemental_model_path: None,
            profile_path: None,
            output_dir: output_dir.into(),
            config: PipelineConfig::default(),
            toggles: TighteningToggleSnapshot::default(),
            use_evidence_cache: false,
            sort_modules: false,
            package_telemetry: false,
        }
    }
}

/// External services the pipeline suspends on.
pub struct Collaborators<'a> {
    /// Fills unhydrated FK constraint columns. Optional.
    pub metadata_provider: Option<&'a dyn RelationshipConstraintMetadataProvider>,
    /// Captures a live profile when no fixture path is given. Optional.
    pub profiler: Option<&'a dyn DataProfiler>,
    /// Supplies static entity rows for seed generation.
    pub static_data: &'a dyn StaticEntityDataProvider,
    /// Supplies dynamic entity inserts. Optional.
    pub dynamic_data: Option<&'a dyn DynamicEntityDataProvider>,
}
