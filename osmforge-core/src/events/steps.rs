//! Stable step names. These strings are a contract: downstream tooling
//! matches on them, so they never change casing or shape.

pub const REQUEST_RECEIVED: &str = "request.received";
pub const MODEL_SCHEMA_WARNINGS: &str = "model.schema.warnings";
pub const MODEL_INGESTED: &str = "model.ingested";
pub const MODEL_FILTERED: &str = "model.filtered";
pub const SUPPLEMENTAL_LOADED: &str = "supplemental.loaded";
pub const PROFILING_CAPTURE_START: &str = "profiling.capture.start";
pub const PROFILING_CAPTURE_COMPLETED: &str = "profiling.capture.completed";
pub const EVIDENCE_CACHE_REQUESTED: &str = "evidence.cache.requested";
pub const EVIDENCE_CACHE_PERSISTED: &str = "evidence.cache.persisted";
pub const EVIDENCE_CACHE_REUSED: &str = "evidence.cache.reused";
pub const POLICY_DECISIONS_SYNTHESIZED: &str = "policy.decisions.synthesized";
pub const SSDT_EMISSION_COMPLETED: &str = "ssdt.emission.completed";
pub const POLICY_LOG_PERSISTED: &str = "policy.log.persisted";
pub const SSDT_SQL_VALIDATION_COMPLETED: &str = "ssdt.sql.validation.completed";
pub const SSDT_SQL_VALIDATION_ERROR: &str = "ssdt.sql.validation.error";
pub const STATIC_SEED_PREFLIGHT: &str = "staticData.seed.preflight";
pub const STATIC_SEED_GENERATED: &str = "staticData.seed.generated";
pub const STATIC_SEED_MODULE_NAME_REMAPPED: &str = "staticData.seed.moduleNameRemapped";
pub const PIPELINE_EXECUTION: &str = "pipeline.execution";

// Full-export composition.
pub const FULL_EXPORT_STARTED: &str = "fullExport.started";
pub const FULL_EXPORT_EXTRACT_COMPLETED: &str = "fullExport.extract.completed";
pub const FULL_EXPORT_PROFILE_COMPLETED: &str = "fullExport.profile.completed";
pub const FULL_EXPORT_BUILD_COMPLETED: &str = "fullExport.build.completed";
pub const FULL_EXPORT_APPLY_SKIPPED: &str = "fullExport.apply.skipped";
pub const FULL_EXPORT_APPLY_COMPLETED: &str = "fullExport.apply.completed";
pub const FULL_EXPORT_APPLY_REMEDIATION_PENDING: &str = "fullExport.apply.remediationPending";
pub const FULL_EXPORT_UAT_USERS_COMPLETED: &str = "fullExport.uatUsers.completed";
pub const FULL_EXPORT_UAT_USERS_SKIPPED: &str = "fullExport.uatUsers.skipped";
pub const FULL_EXPORT_COMPLETED: &str = "fullExport.completed";
