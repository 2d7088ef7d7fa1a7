//! Cooperative cancellation.
//!
//! The pipeline is single-threaded-cooperative; every suspension point
//! (provider calls, cache IO, file writes, SQL validation, apply batches)
//! checks the token before proceeding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{codes, ValidationError};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next suspension point.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-run context threaded through every suspend-capable operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub cancel: CancelToken,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `pipeline.canceled` when cancellation has been requested.
    pub fn checkpoint(&self, step: &str) -> Result<(), ValidationError> {
        if self.cancel.is_canceled() {
            Err(ValidationError::new(
                codes::PIPELINE_CANCELED,
                format!("pipeline canceled during step '{step}'"),
            )
            .with_context(step))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_passes_until_canceled() {
        let ctx = Context::new();
        assert!(ctx.checkpoint("model.ingested").is_ok());
        ctx.cancel.cancel();
        let err = ctx.checkpoint("model.ingested").unwrap_err();
        assert_eq!(err.code, codes::PIPELINE_CANCELED);
    }
}
