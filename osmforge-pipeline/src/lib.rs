//! Build-SSDT pipeline composition.
//!
//! Subsystems:
//! - `request` — the run request and resolved collaborators
//! - `run` — the staged build pipeline with its execution log
//! - `apply` — safe/seed bundle execution against a target
//! - `full_export` — the outer extract → profile → build → apply flow

pub mod apply;
pub mod full_export;
pub mod request;
pub mod run;

pub use apply::{ApplyOrchestrator, ApplyStatus, SchemaDataApplyOutcome, SqlScriptExecutor};
pub use full_export::{run_full_export, FullExportHooks, FullExportOutcome};
pub use request::{BuildSsdtRequest, Collaborators};
pub use run::{run_build_ssdt, PipelineFailure, PipelineOutcome};
