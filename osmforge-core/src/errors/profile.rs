//! Profiling loader and capture errors.

use std::path::PathBuf;

use super::codes;
use super::ErrorCode;

/// Errors raised while loading a profile fixture or capturing a live probe.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile fixture not found: {path}")]
    FixtureMissing { path: PathBuf },

    #[error("failed to parse profile fixture {path}: {reason}")]
    FixtureInvalid { path: PathBuf, reason: String },

    #[error("profile capture failed: {reason}")]
    CaptureFailed { reason: String },
}

impl ErrorCode for ProfileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FixtureMissing { .. } => codes::PROFILING_FIXTURE_MISSING,
            Self::FixtureInvalid { .. } => codes::PROFILING_FIXTURE_INVALID,
            Self::CaptureFailed { .. } => codes::PROFILING_CAPTURE_FAILED,
        }
    }
}
