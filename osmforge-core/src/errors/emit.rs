//! Emitter and SQL validation errors.

use std::path::PathBuf;

use super::codes;
use super::ErrorCode;

/// Errors raised while materializing SSDT artifacts.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize {artifact}: {reason}")]
    Serialize { artifact: &'static str, reason: String },

    #[error("static entity data provider failed for '{entity}': {reason}")]
    ProviderFailed { entity: String, reason: String },

    #[error("SQL parse error in {path}: {message}")]
    SqlParse { path: PathBuf, message: String },
}

impl ErrorCode for EmitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => codes::SSDT_EMITTER_IO,
            Self::Serialize { .. } => codes::SSDT_MANIFEST_SERIALIZE,
            Self::ProviderFailed { .. } => codes::STATIC_DATA_PROVIDER_FAILED,
            Self::SqlParse { .. } => codes::SSDT_SQL_VALIDATION_ERROR,
        }
    }
}
