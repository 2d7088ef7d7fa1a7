//! Profile acquisition — fixture deserialization or live capture.

use std::path::Path;

use osmforge_core::errors::{ErrorCode, ProfileError, StepResult};

use super::types::ProfileSnapshot;
use crate::model::OsmModel;

/// Result of a live capture: the snapshot plus probe-level warnings.
#[derive(Debug, Clone, Default)]
pub struct ProfileCaptureResult {
    pub snapshot: ProfileSnapshot,
    pub warnings: Vec<String>,
}

/// Contract for the live profiler collaborator.
pub trait DataProfiler {
    fn capture(&self, model: &OsmModel) -> Result<ProfileCaptureResult, String>;
}

/// Load a profile snapshot from a JSON fixture file.
pub fn load_from_path(path: &Path) -> StepResult<ProfileSnapshot> {
    if !path.exists() {
        return Err(vec![ProfileError::FixtureMissing {
            path: path.to_path_buf(),
        }
        .to_validation()]);
    }
    let text = std::fs::read_to_string(path).map_err(|e| {
        vec![ProfileError::FixtureInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .to_validation()]
    })?;
    serde_json::from_str(&text).map_err(|e| {
        vec![ProfileError::FixtureInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .to_validation()]
    })
}

/// Capture a live snapshot through the profiler collaborator.
pub fn capture(model: &OsmModel, profiler: &dyn DataProfiler) -> StepResult<ProfileCaptureResult> {
    profiler
        .capture(model)
        .map_err(|reason| vec![ProfileError::CaptureFailed { reason }.to_validation()])
}
