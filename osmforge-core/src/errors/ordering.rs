//! Static seed ordering errors.

use super::codes;
use super::ErrorCode;

/// Errors raised by dependency ordering of static seed tables.
#[derive(Debug, thiserror::Error)]
pub enum OrderingError {
    #[error("cycle detected among static seed tables: {tables}")]
    CycleDetected { tables: String },
}

impl ErrorCode for OrderingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::CycleDetected { .. } => codes::STATIC_DATA_ORDERING_CYCLE,
        }
    }
}
