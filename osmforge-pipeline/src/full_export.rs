//! Full-export composition — extract, profile, build, apply, UAT users.
//!
//! Extraction and UAT user provisioning are collaborator hooks; the build
//! pipeline runs in-process. Every stage lands in the shared execution log
//! under the `fullExport.*` step names.

use osmforge_core::cancel::Context;
use osmforge_core::errors::ValidationError;
use osmforge_core::events::{steps, ExecutionLog, Metadata};

use crate::apply::{ApplyOrchestrator, SchemaDataApplyOutcome, SqlScriptExecutor};
use crate::request::{BuildSsdtRequest, Collaborators};
use crate::run::{run_build_ssdt, PipelineOutcome};

/// Collaborator hooks for the stages the core does not own.
#[derive(Default)]
pub struct FullExportHooks<'a> {
    /// Extract the logical model from the source platform.
    pub extract: Option<&'a dyn Fn() -> Result<(), String>>,
    /// Provision UAT users after a successful apply.
    pub uat_users: Option<&'a dyn Fn() -> Result<(), String>>,
    /// Target database executor for the apply stage.
    pub executor: Option<&'a dyn SqlScriptExecutor>,
}

/// Result of a full export.
pub struct FullExportOutcome {
    pub build: PipelineOutcome,
    pub apply: Option<SchemaDataApplyOutcome>,
    pub log: ExecutionLog,
}

/// Run the full export flow.
pub fn run_full_export(
    request: &BuildSsdtRequest,
    collaborators: &Collaborators<'_>,
    hooks: &FullExportHooks<'_>,
    ctx: &Context,
) -> Result<FullExportOutcome, (String, Vec<ValidationError>, ExecutionLog)> {
    let mut log = ExecutionLog::new();
    log.record(steps::FULL_EXPORT_STARTED, Metadata::new());

    if let Some(extract) = hooks.extract {
        if let Err(reason) = extract() {
            let error = ValidationError::new("extraction.metadata.failed", reason);
            return Err((steps::FULL_EXPORT_STARTED.to_string(), vec![error], log));
        }
        log.record(steps::FULL_EXPORT_EXTRACT_COMPLETED, Metadata::new());
    }

    let build = match run_build_ssdt(request, collaborators, ctx) {
        Ok(outcome) => outcome,
        Err(failure) => {
            for entry in &failure.log.entries {
                log.entries.push(entry.clone());
            }
            return Err((failure.step, failure.errors, log));
        }
    };
    for entry in &build.log.entries {
        log.entries.push(entry.clone());
    }
    log.record(
        steps::FULL_EXPORT_PROFILE_COMPLETED,
        Metadata::new().count("insights", build.insights.len()),
    );
    log.record(
        steps::FULL_EXPORT_BUILD_COMPLETED,
        Metadata::new()
            .count("tables", build.manifest.tables.len())
            .metric("digest", &build.manifest.emission.digest),
    );

    let pending_remediation = build.opportunities.pending_remediation_count();
    let apply_outcome = match (request.config.apply.enabled, hooks.executor) {
        (true, Some(executor)) => {
            let orchestrator =
                ApplyOrchestrator::new(request.config.apply.clone(), executor);
            let safe_script = build.opportunities.safe_script();
            let safe = (!safe_script.is_empty())
                .then(|| ("Opportunities/safe.sql", safe_script.as_str()));
            let seed_scripts = read_seed_scripts(&request.output_dir);
            let seed_validation = build
                .ordering_validation
                .as_ref()
                .map(|v| format!("isValid={}, violations={}", v.is_valid, v.violations.len()));
            match orchestrator.apply(safe, &seed_scripts, pending_remediation, seed_validation, ctx)
            {
                Ok(outcome) => {
                    log.record(
                        steps::FULL_EXPORT_APPLY_COMPLETED,
                        Metadata::new()
                            .count("scripts", outcome.applied_scripts.len())
                            .count("seedScripts", outcome.applied_seed_scripts.len())
                            .count("batches", outcome.executed_batch_count),
                    );
                    if pending_remediation > 0 {
                        log.record(
                            steps::FULL_EXPORT_APPLY_REMEDIATION_PENDING,
                            Metadata::new().count("pendingRemediation", pending_remediation),
                        );
                    }
                    Some(outcome)
                }
                Err((error, partial)) => {
                    log.record(
                        steps::FULL_EXPORT_APPLY_COMPLETED,
                        Metadata::new()
                            .flag("succeeded", false)
                            .count("batches", partial.executed_batch_count),
                    );
                    return Err((steps::FULL_EXPORT_APPLY_COMPLETED.to_string(), vec![error], log));
                }
            }
        }
        _ => {
            log.record(
                steps::FULL_EXPORT_APPLY_SKIPPED,
                Metadata::new().count("pendingRemediation", pending_remediation),
            );
            None
        }
    };

    let applied = apply_outcome.is_some();
    if applied {
        match hooks.uat_users {
            Some(uat_users) => match uat_users() {
                Ok(()) => log.record(steps::FULL_EXPORT_UAT_USERS_COMPLETED, Metadata::new()),
                Err(reason) => {
                    let error = ValidationError::new("pipeline.apply.failed", reason);
                    return Err((
                        steps::FULL_EXPORT_UAT_USERS_COMPLETED.to_string(),
                        vec![error],
                        log,
                    ));
                }
            },
            None => log.record(steps::FULL_EXPORT_UAT_USERS_SKIPPED, Metadata::new()),
        }
    } else {
        log.record(steps::FULL_EXPORT_UAT_USERS_SKIPPED, Metadata::new());
    }

    log.record(steps::FULL_EXPORT_COMPLETED, Metadata::new());
    Ok(FullExportOutcome {
        build,
        apply: apply_outcome,
        log,
    })
}

/// Seed scripts from disk, in emitted path order.
fn read_seed_scripts(output_dir: &std::path::Path) -> Vec<(String, String)> {
    let mut scripts = Vec::new();
    for root in ["Seeds", "BaselineSeeds"] {
        collect_sql_files(&output_dir.join(root), root, &mut scripts);
    }
    scripts.sort_by(|a, b| a.0.cmp(&b.0));
    scripts
}

fn collect_sql_files(dir: &std::path::Path, prefix: &str, out: &mut Vec<(String, String)>) {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = read_dir.flatten().collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_dir() {
            collect_sql_files(&path, &format!("{prefix}/{name}"), out);
        } else if name.ends_with(".sql") {
            if let Ok(content) = std::fs::read_to_string(&path) {
                out.push((format!("{prefix}/{name}"), content));
            }
        }
    }
}
