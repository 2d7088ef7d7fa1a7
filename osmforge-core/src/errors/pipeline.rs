//! Stage-level pipeline errors.

use super::codes;
use super::ErrorCode;

/// Wrapper carrying a failing stage and its underlying errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline canceled during step '{step}'")]
    Canceled { step: String },

    #[error("SQL validation failed: {error_count} error(s) across {total_files} file(s)")]
    SqlValidationFailed {
        error_count: usize,
        total_files: usize,
    },

    #[error("step '{step}' failed with {count} error(s)")]
    StepFailed { step: String, count: usize },
}

impl ErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Canceled { .. } => codes::PIPELINE_CANCELED,
            Self::SqlValidationFailed { .. } => codes::PIPELINE_BUILD_SSDT_SQL_VALIDATION_FAILED,
            Self::StepFailed { .. } => codes::PIPELINE_STEP_FAILED,
        }
    }
}
