//! Model ingestion and hydration errors.

use std::path::PathBuf;

use super::codes;
use super::ErrorCode;

/// Errors raised while loading, filtering, or hydrating the logical model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to load model from {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("entity '{entity}' has a null '{array}' array")]
    NullEntityArray { entity: String, array: &'static str },

    #[error("model has a null 'modules' array")]
    NullModuleArray,

    #[error("filtering removed every attribute of entity '{entity}'")]
    NoAttributesRemain { entity: String },
}

impl ErrorCode for ModelError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LoadFailed { .. } => codes::MODEL_LOAD_FAILED,
            Self::NullEntityArray { .. } => codes::EXTRACTION_CONTRACT_ENTITY_ARRAY,
            Self::NullModuleArray => codes::EXTRACTION_CONTRACT_MODULE_ARRAY,
            Self::NoAttributesRemain { .. } => codes::MODEL_ENTITY_ATTRIBUTES_EMPTY,
        }
    }
}
