//! Apply orchestrator errors.

use super::codes;
use super::ErrorCode;

/// Errors raised while executing script batches against the target.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("batch {batch_index} of '{script}' failed: {reason}")]
    BatchFailed {
        script: String,
        batch_index: usize,
        reason: String,
    },

    #[error("apply stage failed: {reason}")]
    Failed { reason: String },
}

impl ErrorCode for ApplyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::BatchFailed { .. } => codes::PIPELINE_APPLY_BATCH_FAILED,
            Self::Failed { .. } => codes::PIPELINE_APPLY_FAILED,
        }
    }
}
