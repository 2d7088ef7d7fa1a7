//! Stable error and warning code constants.

// ---- model.* — ingestion and hydration ----
pub const MODEL_LOAD_FAILED: &str = "model.load.failed";
pub const MODEL_SCHEMA_WARNINGS: &str = "model.schema.warnings";
pub const MODEL_MODULE_EMPTY: &str = "model.module.empty";
pub const MODEL_ATTRIBUTE_COLUMN_DUPLICATE: &str = "model.attribute.column.duplicate";
pub const MODEL_ENTITY_ATTRIBUTES_EMPTY: &str = "entity.attributes.empty";
pub const MODEL_HYDRATION_CONSTRAINT_UNNAMED: &str = "model.hydration.constraint.unnamed";
pub const MODEL_HYDRATION_CONSTRAINT_UNRESOLVED: &str = "model.hydration.constraint.unresolved";

// ---- extraction.* — JSON contracts and metadata reader ----
pub const EXTRACTION_CONTRACT_MODULE_ARRAY: &str = "extraction.sql.contract.moduleArray";
pub const EXTRACTION_CONTRACT_ENTITY_ARRAY: &str = "extraction.sql.contract.entityArray";
pub const EXTRACTION_METADATA_FAILED: &str = "extraction.metadata.failed";

// ---- config.* ----
pub const CONFIG_OVERLAY_PARSE: &str = "config.overlay.parse";
pub const CONFIG_OVERLAY_INVALID_VALUE: &str = "config.overlay.invalidValue";

// ---- profiling.* ----
pub const PROFILING_FIXTURE_MISSING: &str = "profiling.fixture.missing";
pub const PROFILING_FIXTURE_INVALID: &str = "profiling.fixture.invalid";
pub const PROFILING_CAPTURE_FAILED: &str = "profiling.capture.failed";

// ---- cache.* ----
pub const CACHE_MODEL_NOT_FOUND: &str = "cache.model.notFound";
pub const CACHE_ARTIFACT_NOT_FOUND: &str = "cache.artifact.notFound";
pub const CACHE_MANIFEST_IO: &str = "cache.manifest.io";
pub const CACHE_LOCK_FAILED: &str = "cache.lock.failed";
pub const CACHE_RETENTION_FAILED: &str = "cache.retention.failed";

// ---- policy.* ----
pub const POLICY_BUDGET_EXCEEDED: &str = "policy.budget.exceeded";
pub const POLICY_PROBE_UNAVAILABLE: &str = "policy.probe.unavailable";

// ---- ssdt.* — emitter ----
pub const SSDT_EMITTER_IO: &str = "ssdt.emitter.io";
pub const SSDT_MANIFEST_SERIALIZE: &str = "ssdt.manifest.serialize";
pub const SSDT_SQL_VALIDATION_ERROR: &str = "ssdt.sql.validation.error";

// ---- staticData.* ----
pub const STATIC_DATA_PROVIDER_FAILED: &str = "staticData.provider.failed";
pub const STATIC_DATA_ORDERING_CYCLE: &str = "staticData.ordering.cycleDetected";

// ---- pipeline.* — stage wrappers ----
pub const PIPELINE_CANCELED: &str = "pipeline.canceled";
pub const PIPELINE_BUILD_SSDT_SQL_VALIDATION_FAILED: &str =
    "pipeline.buildSsdt.sql.validationFailed";
pub const PIPELINE_APPLY_FAILED: &str = "pipeline.apply.failed";
pub const PIPELINE_APPLY_BATCH_FAILED: &str = "pipeline.apply.batchFailed";
pub const PIPELINE_STEP_FAILED: &str = "pipeline.step.failed";
