//! Shared constants and compiled defaults.

/// osmforge version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding per-subsystem log directives.
pub const LOG_ENV_VAR: &str = "OSMFORGE_LOG";

/// Log filter used when the environment provides nothing usable.
pub const LOG_FALLBACK_DIRECTIVE: &str = "osmforge=info";

/// Default remediation-requiring nullability proposals allowed per entity.
pub const DEFAULT_NULL_BUDGET: u32 = 10;

/// Default emission/validation fan-out degree (1 = sequential, 0 = no limit).
pub const DEFAULT_MODULE_PARALLELISM: usize = 1;

/// Default per-batch command timeout for apply.
pub const DEFAULT_COMMAND_TIMEOUT_SECONDS: u32 = 30;

/// Evidence cache manifest format version.
pub const CACHE_MANIFEST_VERSION: u32 = 1;

/// Hash algorithm recorded in the emission digest block.
pub const EMISSION_DIGEST_ALGORITHM: &str = "sha256";

/// Placeholder name for an unnamed foreign key in validation output.
pub const UNNAMED_FOREIGN_KEY: &str = "<unnamed>";

/// Name of the assembled SQL project file.
pub const SQLPROJ_FILE_NAME: &str = "OutSystemsModel.sqlproj";

/// Name of the combined static seed master file.
pub const MASTER_SEED_FILE_NAME: &str = "StaticEntities.seed.sql";
