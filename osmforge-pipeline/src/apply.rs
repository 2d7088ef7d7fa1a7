//! Apply orchestration — execute the safe bundle and seeds against a target.

use std::time::Instant;

use osmforge_core::cancel::Context;
use osmforge_core::config::SchemaApplyOptions;
use osmforge_core::errors::{ApplyError, ErrorCode, ValidationError};

/// Contract for the database executor collaborator. One call per batch.
pub trait SqlScriptExecutor {
    fn execute_batch(&self, batch: &str, timeout_seconds: u32) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Skipped,
    Failed,
}

/// Outcome of the apply stage. On failure the partial outcome survives.
#[derive(Debug, Clone)]
pub struct SchemaDataApplyOutcome {
    pub status: ApplyStatus,
    pub applied_scripts: Vec<String>,
    pub applied_seed_scripts: Vec<String>,
    pub skipped_scripts: Vec<String>,
    pub executed_batch_count: usize,
    pub duration_ms: u64,
    pub max_batch_size_bytes: usize,
    pub streaming_enabled: bool,
    /// Carried from the seed ordering validation, when seeds were applied.
    pub static_seed_validation: Option<String>,
    pub pending_remediation_count: usize,
}

/// Executes scripts batch by batch with the configured timeout.
pub struct ApplyOrchestrator<'a> {
    options: SchemaApplyOptions,
    executor: &'a dyn SqlScriptExecutor,
}

impl<'a> ApplyOrchestrator<'a> {
    pub fn new(options: SchemaApplyOptions, executor: &'a dyn SqlScriptExecutor) -> Self {
        Self { options, executor }
    }

    /// Apply the safe bundle then the seed scripts.
    ///
    /// Disabled options yield a `Skipped` outcome with the would-be scripts
    /// listed. Any failing batch aborts with the partial outcome preserved.
    pub fn apply(
        &self,
        safe_script: Option<(&str, &str)>,
        seed_scripts: &[(String, String)],
        pending_remediation_count: usize,
        seed_validation_summary: Option<String>,
        ctx: &Context,
    ) -> Result<SchemaDataApplyOutcome, (ValidationError, SchemaDataApplyOutcome)> {
        let mut outcome = SchemaDataApplyOutcome {
            status: ApplyStatus::Skipped,
            applied_scripts: Vec::new(),
            applied_seed_scripts: Vec::new(),
            skipped_scripts: Vec::new(),
            executed_batch_count: 0,
            duration_ms: 0,
            max_batch_size_bytes: 0,
            streaming_enabled: false,
            static_seed_validation: seed_validation_summary,
            pending_remediation_count,
        };

        if !self.options.enabled {
            if let Some((name, _)) = safe_script {
                outcome.skipped_scripts.push(name.to_string());
            }
            outcome
                .skipped_scripts
                .extend(seed_scripts.iter().map(|(name, _)| name.clone()));
            return Ok(outcome);
        }

        let started = Instant::now();

        if self.options.apply_safe_script {
            if let Some((name, content)) = safe_script {
                self.run_script(name, content, &mut outcome, started, ctx)?;
                outcome.applied_scripts.push(name.to_string());
            }
        } else if let Some((name, _)) = safe_script {
            outcome.skipped_scripts.push(name.to_string());
        }

        if self.options.apply_static_seeds {
            for (name, content) in seed_scripts {
                self.run_script(name, content, &mut outcome, started, ctx)?;
                outcome.applied_seed_scripts.push(name.clone());
            }
        } else {
            outcome
                .skipped_scripts
                .extend(seed_scripts.iter().map(|(name, _)| name.clone()));
        }

        outcome.status = ApplyStatus::Applied;
        outcome.duration_ms = started.elapsed().as_millis() as u64;
        Ok(outcome)
    }

    fn run_script(
        &self,
        name: &str,
        content: &str,
        outcome: &mut SchemaDataApplyOutcome,
        started: Instant,
        ctx: &Context,
    ) -> Result<(), (ValidationError, SchemaDataApplyOutcome)> {
        for (index, batch) in split_batches(content).into_iter().enumerate() {
            if let Err(e) = ctx.checkpoint("pipeline.apply") {
                outcome.status = ApplyStatus::Failed;
                outcome.duration_ms = started.elapsed().as_millis() as u64;
                return Err((e, outcome.clone()));
            }
            outcome.max_batch_size_bytes = outcome.max_batch_size_bytes.max(batch.len());
            if let Err(reason) = self
                .executor
                .execute_batch(batch, self.options.command_timeout_seconds)
            {
                outcome.status = ApplyStatus::Failed;
                outcome.duration_ms = started.elapsed().as_millis() as u64;
                let error = ApplyError::BatchFailed {
                    script: name.to_string(),
                    batch_index: index,
                    reason,
                };
                return Err((error.to_validation(), outcome.clone()));
            }
            outcome.executed_batch_count += 1;
        }
        Ok(())
    }
}

/// Split a script on `GO` separator lines into executable batches.
fn split_batches(content: &str) -> Vec<&str> {
    let mut batches = Vec::new();
    let mut start = 0usize;
    let mut offset = 0usize;
    for line in content.split_inclusive('\n') {
        if line.trim().eq_ignore_ascii_case("go") {
            let batch = content[start..offset].trim();
            if !batch.is_empty() {
                batches.push(batch);
            }
            start = offset + line.len();
        }
        offset += line.len();
    }
    let tail = content[start..].trim();
    if !tail.is_empty() {
        batches.push(tail);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingExecutor {
        batches: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl SqlScriptExecutor for RecordingExecutor {
        fn execute_batch(&self, batch: &str, _timeout: u32) -> Result<(), String> {
            let mut batches = self.batches.lock().unwrap();
            if self.fail_on == Some(batches.len()) {
                return Err("boom".to_string());
            }
            batches.push(batch.to_string());
            Ok(())
        }
    }

    fn enabled_options() -> SchemaApplyOptions {
        SchemaApplyOptions {
            enabled: true,
            connection_string: Some("Server=.;Database=Target".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn disabled_apply_skips_and_forwards_remediation_count() {
        let executor = RecordingExecutor {
            batches: Mutex::new(Vec::new()),
            fail_on: None,
        };
        let orchestrator = ApplyOrchestrator::new(SchemaApplyOptions::default(), &executor);
        let outcome = orchestrator
            .apply(
                Some(("Opportunities/safe.sql", "ALTER TABLE [dbo].[T];\nGO\n")),
                &[("Seeds/a.seed.sql".to_string(), "INSERT;\nGO\n".to_string())],
                3,
                None,
                &Context::new(),
            )
            .unwrap();

        assert_eq!(outcome.status, ApplyStatus::Skipped);
        assert_eq!(outcome.skipped_scripts.len(), 2);
        assert_eq!(outcome.pending_remediation_count, 3);
        assert_eq!(outcome.executed_batch_count, 0);
        assert!(executor.batches.lock().unwrap().is_empty());
    }

    #[test]
    fn enabled_apply_executes_safe_then_seeds() {
        let executor = RecordingExecutor {
            batches: Mutex::new(Vec::new()),
            fail_on: None,
        };
        let orchestrator = ApplyOrchestrator::new(enabled_options(), &executor);
        let outcome = orchestrator
            .apply(
                Some(("safe.sql", "ALTER A;\nGO\nALTER B;\nGO\n")),
                &[("seed.sql".to_string(), "INSERT C;\nGO\n".to_string())],
                0,
                None,
                &Context::new(),
            )
            .unwrap();

        assert_eq!(outcome.status, ApplyStatus::Applied);
        assert_eq!(outcome.executed_batch_count, 3);
        assert_eq!(outcome.applied_scripts, vec!["safe.sql"]);
        assert_eq!(outcome.applied_seed_scripts, vec!["seed.sql"]);
        let batches = executor.batches.lock().unwrap();
        assert_eq!(batches[0], "ALTER A;");
        assert_eq!(batches[2], "INSERT C;");
    }

    #[test]
    fn failing_batch_preserves_partial_outcome() {
        let executor = RecordingExecutor {
            batches: Mutex::new(Vec::new()),
            fail_on: Some(1),
        };
        let orchestrator = ApplyOrchestrator::new(enabled_options(), &executor);
        let (error, partial) = orchestrator
            .apply(
                Some(("safe.sql", "ALTER A;\nGO\nALTER B;\nGO\n")),
                &[],
                0,
                None,
                &Context::new(),
            )
            .unwrap_err();

        assert_eq!(error.code, "pipeline.apply.batchFailed");
        assert_eq!(partial.status, ApplyStatus::Failed);
        assert_eq!(partial.executed_batch_count, 1);
    }
}
