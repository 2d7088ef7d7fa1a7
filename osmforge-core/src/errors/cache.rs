//! Evidence cache errors.

use std::path::PathBuf;

use super::codes;
use super::ErrorCode;

/// Errors raised by the evidence cache service.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("source model file not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("cached artifact not found: {path}")]
    ArtifactNotFound { path: PathBuf },

    #[error("manifest IO failure at {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to acquire cache lock at {path}: {source}")]
    LockFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("retention pruning failed under {root}: {source}")]
    RetentionFailed {
        root: PathBuf,
        source: std::io::Error,
    },
}

impl ErrorCode for CacheError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ModelNotFound { .. } => codes::CACHE_MODEL_NOT_FOUND,
            Self::ArtifactNotFound { .. } => codes::CACHE_ARTIFACT_NOT_FOUND,
            Self::ManifestIo { .. } => codes::CACHE_MANIFEST_IO,
            Self::LockFailed { .. } => codes::CACHE_LOCK_FAILED,
            Self::RetentionFailed { .. } => codes::CACHE_RETENTION_FAILED,
        }
    }
}
