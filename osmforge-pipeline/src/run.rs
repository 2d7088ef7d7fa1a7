//! The staged build-ssdt pipeline.
//!
//! Each stage appends to the execution log and either extends the state or
//! short-circuits with its accumulated errors. On failure the log is
//! persisted into the output directory when that directory already exists.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;

use osmforge_analysis::model::ingest::{filter_model, load_from_path, LoadOptions};
use osmforge_analysis::model::{hydrate, merge, Entity, OsmModel};
use osmforge_analysis::naming::EffectiveNameResolver;
use osmforge_analysis::ordering::{validate_order, TopologicalOrderingValidationResult};
use osmforge_analysis::profile::{self, derive_insights, ProfileSnapshot, ProfilingInsight};
use osmforge_analysis::tightening::{
    OpportunitiesReport, PolicyDecisionReport, PolicyDecisionSet, TighteningPolicyEngine,
};
use osmforge_cache::{CacheOutcome, CacheRequest, EvidenceCacheService};
use osmforge_core::cancel::Context;
use osmforge_core::config::DynamicInsertOutputMode;
use osmforge_core::constants::SQLPROJ_FILE_NAME;
use osmforge_core::errors::{codes, ErrorCode, PipelineError, ValidationError};
use osmforge_core::events::{steps, ExecutionLog, Metadata};
use osmforge_core::types::TableName;
use osmforge_emit::emitter::write_artifact;
use osmforge_emit::package::{package_artifacts, DEFAULT_PACKAGE_ENTRIES};
use osmforge_emit::providers::DynamicExtractionRequest;
use osmforge_emit::scripts::{generate_static_seeds, render_sqlproj, SqlLiteralFormatter};
use osmforge_emit::validation::validate_scripts;
use osmforge_emit::{Emitter, SqlValidationSummary, SsdtManifest};

use crate::request::{BuildSsdtRequest, Collaborators};

/// Everything a successful run leaves behind, beyond the files on disk.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub log: ExecutionLog,
    pub manifest: SsdtManifest,
    pub decisions: PolicyDecisionSet,
    pub opportunities: OpportunitiesReport,
    pub insights: Vec<ProfilingInsight>,
    pub sql_validation: SqlValidationSummary,
    pub seed_order: Vec<TableName>,
    pub ordering_validation: Option<TopologicalOrderingValidationResult>,
    pub warnings: Vec<String>,
}

/// A failed run: the failing step, its errors, and the log so far.
#[derive(Debug)]
pub struct PipelineFailure {
    pub step: String,
    pub errors: Vec<ValidationError>,
    pub log: ExecutionLog,
}

/// Execute the build-ssdt pipeline end to end.
pub fn run_build_ssdt(
    request: &BuildSsdtRequest,
    collaborators: &Collaborators<'_>,
    ctx: &Context,
) -> Result<PipelineOutcome, PipelineFailure> {
    let started = Instant::now();
    let mut log = ExecutionLog::new();
    let mut warnings: Vec<String> = Vec::new();
    let output_dir = request.output_dir.clone();

    log.record(
        steps::REQUEST_RECEIVED,
        Metadata::new()
            .path("model", &request.model_path)
            .path("output", &output_dir)
            .flag("evidenceCache", request.use_evidence_cache),
    );

    // ---- ingest ----
    checkpoint(ctx, steps::MODEL_INGESTED, &mut log, &output_dir)?;
    let load_options = LoadOptions {
        sort_modules: request.sort_modules,
    };
    let loaded = load_from_path(&request.model_path, &load_options)
        .map_err(|errors| fail(steps::MODEL_INGESTED, errors, &mut log, &output_dir))?;
    let mut model = loaded.model;
    if !loaded.warnings.is_empty() {
        log.record(
            steps::MODEL_SCHEMA_WARNINGS,
            Metadata::new().count("warnings", loaded.warnings.len()),
        );
    }
    warnings.extend(loaded.warnings);
    log.record(
        steps::MODEL_INGESTED,
        Metadata::new()
            .count("modules", model.modules.len())
            .count("entities", model.entities().count()),
    );

    // ---- supplemental merge ----
    if let Some(supplemental_path) = &request.supplemental_model_path {
        let supplemental = load_from_path(supplemental_path, &load_options)
            .map_err(|errors| fail(steps::SUPPLEMENTAL_LOADED, errors, &mut log, &output_dir))?;
        warnings.extend(supplemental.warnings);
        let before = model.entities().count();
        warnings.extend(merge::merge_supplemental(&mut model, supplemental.model));
        log.record(
            steps::SUPPLEMENTAL_LOADED,
            Metadata::new()
                .count("entities", model.entities().count() - before)
                .path("supplemental", supplemental_path),
        );
    }

    // ---- hydration ----
    if let Some(provider) = collaborators.metadata_provider {
        checkpoint(ctx, steps::MODEL_INGESTED, &mut log, &output_dir)?;
        let hydration_warnings = hydrate::hydrate_model(&mut model, provider).map_err(|reason| {
            fail(
                steps::MODEL_INGESTED,
                vec![ValidationError::new(codes::EXTRACTION_METADATA_FAILED, reason)],
                &mut log,
                &output_dir,
            )
        })?;
        warnings.extend(hydration_warnings);
    }

    // ---- filter ----
    let filtered = filter_model(&model, &request.config.selection)
        .map_err(|errors| fail(steps::MODEL_FILTERED, errors, &mut log, &output_dir))?;
    log.record(
        steps::MODEL_FILTERED,
        Metadata::new()
            .count("modules", filtered.modules.len())
            .count("entities", filtered.entities().count()),
    );

    // ---- profiling ----
    checkpoint(ctx, steps::PROFILING_CAPTURE_START, &mut log, &output_dir)?;
    log.record(
        steps::PROFILING_CAPTURE_START,
        Metadata::new().flag("fixture", request.profile_path.is_some()),
    );
    let snapshot = acquire_profile(request, collaborators, &filtered, &mut warnings)
        .map_err(|errors| fail(steps::PROFILING_CAPTURE_COMPLETED, errors, &mut log, &output_dir))?;
    let insights = derive_insights(&snapshot);
    log.record(
        steps::PROFILING_CAPTURE_COMPLETED,
        Metadata::new()
            .count("columns", snapshot.columns.len())
            .count("foreignKeys", snapshot.foreign_keys.len())
            .count("insights", insights.len()),
    );

    // ---- evidence cache ----
    if request.use_evidence_cache {
        checkpoint(ctx, steps::EVIDENCE_CACHE_REQUESTED, &mut log, &output_dir)?;
        log.record(
            steps::EVIDENCE_CACHE_REQUESTED,
            Metadata::new().path("root", &request.config.cache.root),
        );
        let metadata: BTreeMap<String, String> = request
            .toggles
            .entries
            .iter()
            .map(|t| (t.key.clone(), t.value.clone()))
            .collect();
        let cache_request = CacheRequest {
            command: "build-ssdt".to_string(),
            model_path: request.model_path.clone(),
            profile_path: request.profile_path.clone(),
            dmm_path: None,
            config_payload: None,
            metadata,
            selection: request.config.selection.clone(),
        };
        let service = EvidenceCacheService::new(request.config.cache.clone());
        let result = service.cache(&cache_request).map_err(|e| {
            fail(
                steps::EVIDENCE_CACHE_REQUESTED,
                vec![e.to_validation()],
                &mut log,
                &output_dir,
            )
        })?;
        let mut metadata = Metadata::new().entry("cache.key", result.key.clone());
        for (k, v) in &result.evaluation {
            metadata = metadata.entry(k.clone(), v.clone());
        }
        match result.outcome {
            CacheOutcome::Created => log.record(steps::EVIDENCE_CACHE_PERSISTED, metadata),
            CacheOutcome::Reused => log.record(steps::EVIDENCE_CACHE_REUSED, metadata),
        }
    }

    // ---- policy ----
    let resolver = EffectiveNameResolver::build(&filtered, &request.config.naming);
    let engine = TighteningPolicyEngine::new(
        request.config.tightening.clone(),
        request.toggles.clone(),
    );
    let (decisions, opportunities) = engine.decide(&filtered, &snapshot, &resolver, Utc::now());
    let decision_report = PolicyDecisionReport::from_decisions(&decisions);
    log.record(
        steps::POLICY_DECISIONS_SYNTHESIZED,
        Metadata::new()
            .count("nullability", decisions.nullability.len())
            .count("uniqueness", decisions.uniqueness.len())
            .count("foreignKeys", decisions.foreign_keys.len())
            .count("opportunities", opportunities.opportunities.len())
            .count("diagnostics", decisions.diagnostics.len()),
    );

    // ---- emission ----
    checkpoint(ctx, steps::SSDT_EMISSION_COMPLETED, &mut log, &output_dir)?;
    let emitter = Emitter::new(request.config.emission.clone());
    let emission = emitter
        .emit(
            &filtered,
            &decisions,
            &decision_report,
            &opportunities,
            &snapshot,
            &resolver,
            &output_dir,
            ctx,
        )
        .map_err(|errors| {
            cleanup_emission_artifacts(&output_dir);
            fail(steps::SSDT_EMISSION_COMPLETED, errors, &mut log, &output_dir)
        })?;
    log.record(
        steps::SSDT_EMISSION_COMPLETED,
        Metadata::new()
            .count("tables", emission.table_files.len())
            .metric("digest", &emission.manifest.emission.digest),
    );
    log.record(
        steps::POLICY_LOG_PERSISTED,
        Metadata::new().path("decisionLog", output_dir.join("decision-log.json")),
    );

    // ---- sqlproj assembly ----
    let script_paths: Vec<String> = emission
        .table_files
        .iter()
        .map(|(path, _)| path.clone())
        .collect();
    let sqlproj = render_sqlproj("OutSystemsModel", &script_paths);
    write_artifact(&output_dir, SQLPROJ_FILE_NAME, &sqlproj).map_err(|e| {
        fail(
            steps::SSDT_EMISSION_COMPLETED,
            vec![e.to_validation()],
            &mut log,
            &output_dir,
        )
    })?;

    // ---- SQL validation ----
    checkpoint(ctx, steps::SSDT_SQL_VALIDATION_COMPLETED, &mut log, &output_dir)?;
    let sql_validation = validate_scripts(
        &emission.table_files,
        request.config.emission.effective_parallelism(),
    );
    for error in &sql_validation.errors {
        log.record(
            steps::SSDT_SQL_VALIDATION_ERROR,
            Metadata::new()
                .entry("paths.file", error.file.clone())
                .entry("message", error.message.clone()),
        );
    }
    log.record(
        steps::SSDT_SQL_VALIDATION_COMPLETED,
        Metadata::new()
            .count("files", sql_validation.total_files)
            .count("errors", sql_validation.error_count)
            .count("warnings", sql_validation.warning_count),
    );
    if sql_validation.error_count > 0 {
        write_validations(&output_dir, &sql_validation, None);
        let error = PipelineError::SqlValidationFailed {
            error_count: sql_validation.error_count,
            total_files: sql_validation.total_files,
        };
        return Err(fail(
            steps::SSDT_SQL_VALIDATION_COMPLETED,
            vec![error.to_validation()],
            &mut log,
            &output_dir,
        ));
    }

    // ---- static seeds ----
    checkpoint(ctx, steps::STATIC_SEED_PREFLIGHT, &mut log, &output_dir)?;
    let static_entities: Vec<&Entity> = filtered.entities().filter(|e| e.is_static).collect();
    log.record(
        steps::STATIC_SEED_PREFLIGHT,
        Metadata::new().count("staticEntities", static_entities.len()),
    );
    let generation = generate_static_seeds(
        &filtered,
        &emission.smo,
        collaborators.static_data,
        &SqlLiteralFormatter::new(),
        &request.config.emission,
        &resolver,
        &emission.folders,
    )
    .map_err(|errors| fail(steps::STATIC_SEED_GENERATED, errors, &mut log, &output_dir))?;

    let mut written_seed_files = Vec::new();
    for (relative_path, content) in &generation.files {
        if let Err(e) = write_artifact(&output_dir, relative_path, content) {
            remove_files(&output_dir, &written_seed_files);
            return Err(fail(
                steps::STATIC_SEED_GENERATED,
                vec![e.to_validation()],
                &mut log,
                &output_dir,
            ));
        }
        written_seed_files.push(relative_path.clone());
    }

    for folder in emission.folders.iter().filter(|f| f.was_remapped()) {
        log.record(
            steps::STATIC_SEED_MODULE_NAME_REMAPPED,
            Metadata::new()
                .entry("module.originalName", folder.original_name.clone())
                .entry("module.sanitizedName", folder.sanitized_name.clone())
                .entry("module.disambiguatedName", folder.disambiguated_name.clone()),
        );
    }
    log.record(
        steps::STATIC_SEED_GENERATED,
        Metadata::new()
            .count("files", generation.files.len())
            .count("tables", generation.table_count)
            .count("rows", generation.row_count),
    );

    let ordering_validation = if static_entities.is_empty() {
        None
    } else {
        Some(validate_order(&generation.order, &static_entities, &resolver))
    };
    write_validations(&output_dir, &sql_validation, ordering_validation.as_ref());

    // ---- dynamic inserts (optional) ----
    emit_dynamic_inserts(request, collaborators, &emission.smo, &output_dir, &mut warnings);

    // ---- execution log + telemetry ----
    log.record(
        steps::PIPELINE_EXECUTION,
        Metadata::new()
            .flag("succeeded", true)
            .metric("durationMs", started.elapsed().as_millis()),
    );
    if let Err(e) = log.persist(&output_dir) {
        warnings.push(format!("execution log not persisted: {e}"));
    }
    if request.package_telemetry {
        if let Err(e) = package_artifacts(
            &output_dir.join("telemetry.zip"),
            &output_dir,
            DEFAULT_PACKAGE_ENTRIES,
        ) {
            warnings.push(format!("telemetry packaging failed: {e}"));
        }
    }

    Ok(PipelineOutcome {
        log,
        manifest: emission.manifest,
        decisions,
        opportunities,
        insights,
        sql_validation,
        seed_order: generation.order,
        ordering_validation,
        warnings,
    })
}

fn acquire_profile(
    request: &BuildSsdtRequest,
    collaborators: &Collaborators<'_>,
    model: &OsmModel,
    warnings: &mut Vec<String>,
) -> Result<ProfileSnapshot, Vec<ValidationError>> {
    if let Some(path) = &request.profile_path {
        return profile::load::load_from_path(path);
    }
    if let Some(profiler) = collaborators.profiler {
        let capture = profile::load::capture(model, profiler)?;
        warnings.extend(capture.warnings);
        return Ok(capture.snapshot);
    }
    warnings.push(
        "profiling.capture: no fixture and no profiler; continuing with empty evidence"
            .to_string(),
    );
    Ok(ProfileSnapshot::default())
}

fn emit_dynamic_inserts(
    request: &BuildSsdtRequest,
    collaborators: &Collaborators<'_>,
    smo: &osmforge_emit::smo::SmoModel,
    output_dir: &Path,
    warnings: &mut Vec<String>,
) {
    let mode = request.config.emission.dynamic_insert_mode;
    if mode == DynamicInsertOutputMode::Disabled {
        return;
    }
    let Some(provider) = collaborators.dynamic_data else {
        warnings.push("dynamic inserts requested but no provider was supplied".to_string());
        return;
    };
    let entities = smo
        .tables
        .iter()
        .filter(|t| !t.is_static)
        .map(|t| osmforge_emit::providers::StaticEntityDefinition {
            module: t.module.as_str().to_string(),
            logical_name: t.logical_name.clone(),
            schema: t.schema.clone(),
            physical_table: t.physical_name.clone(),
            effective_table: t.effective_name.clone(),
            columns: t.columns.iter().map(|c| c.name.clone()).collect(),
            key_column: t.primary_key.as_ref().and_then(|pk| pk.columns.first().cloned()),
        })
        .collect();
    let extraction = match provider.extract(&DynamicExtractionRequest { entities }) {
        Ok(extraction) => extraction,
        Err(reason) => {
            warnings.push(format!("dynamic insert extraction failed: {reason}"));
            return;
        }
    };
    match mode {
        DynamicInsertOutputMode::Disabled => {}
        DynamicInsertOutputMode::PerEntity => {
            for entity in &extraction.entities {
                let content = format!("{}\nGO\n", entity.insert_statements.join("\n"));
                let path = format!("Dynamic/{}.sql", entity.logical_name.as_str());
                if let Err(e) = write_artifact(output_dir, &path, &content) {
                    warnings.push(format!("dynamic insert write failed: {e}"));
                }
            }
        }
        DynamicInsertOutputMode::SingleFile => {
            let mut content = String::new();
            for entity in &extraction.entities {
                content.push_str(&entity.insert_statements.join("\n"));
                content.push_str("\nGO\n");
            }
            if let Err(e) = write_artifact(output_dir, "Dynamic/DynamicEntities.sql", &content) {
                warnings.push(format!("dynamic insert write failed: {e}"));
            }
        }
    }
}

fn write_validations(
    output_dir: &Path,
    sql: &SqlValidationSummary,
    ordering: Option<&TopologicalOrderingValidationResult>,
) {
    let payload = json!({
        "generatedAtUtc": Utc::now().to_rfc3339(),
        "sql": sql,
        "ordering": ordering,
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => {
            if let Err(e) = write_artifact(output_dir, "validations.json", &text) {
                tracing::warn!(error = %e, "validations.json not written");
            }
        }
        Err(e) => tracing::warn!(error = %e, "validations.json not serialized"),
    }
}

fn checkpoint(
    ctx: &Context,
    step: &'static str,
    log: &mut ExecutionLog,
    output_dir: &Path,
) -> Result<(), PipelineFailure> {
    ctx.checkpoint(step)
        .map_err(|e| fail(step, vec![e], log, output_dir))
}

/// Persist the log (when the output directory exists) and build the failure.
fn fail(
    step: &str,
    errors: Vec<ValidationError>,
    log: &mut ExecutionLog,
    output_dir: &Path,
) -> PipelineFailure {
    log.record(
        steps::PIPELINE_EXECUTION,
        Metadata::new()
            .flag("succeeded", false)
            .entry("step", step)
            .count("errors", errors.len()),
    );
    if output_dir.exists() {
        if let Err(e) = log.persist(output_dir) {
            tracing::warn!(error = %e, "execution log not persisted after failure");
        }
    }
    PipelineFailure {
        step: step.to_string(),
        errors,
        log: log.clone(),
    }
}

fn cleanup_emission_artifacts(output_dir: &Path) {
    for dir in ["Modules", "Tables", "Opportunities"] {
        let _ = std::fs::remove_dir_all(output_dir.join(dir));
    }
    for file in ["manifest.json", "decision-log.json", "opportunities.json"] {
        let _ = std::fs::remove_file(output_dir.join(file));
    }
}

fn remove_files(output_dir: &Path, relative_paths: &[String]) {
    for relative_path in relative_paths {
        let _ = std::fs::remove_file(output_dir.join(relative_path));
    }
}
