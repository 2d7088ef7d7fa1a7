//! SSDT artifact emission.
//!
//! Subsystems:
//! - `smo` — the in-memory physical model built from decisions
//! - `scripts` — table, seed, and project file rendering
//! - `providers` — data provider contracts for seeds and dynamic inserts
//! - `manifest` — the emission manifest and its digest
//! - `emitter` — file materialization with bounded fan-out
//! - `validation` — parse-validation of emitted SQL
//! - `package` — telemetry archive assembly

pub mod emitter;
pub mod manifest;
pub mod package;
pub mod providers;
pub mod scripts;
pub mod smo;
pub mod validation;

pub use emitter::{EmissionResult, Emitter};
pub use manifest::{SsdtManifest, TableManifestEntry};
pub use validation::{validate_scripts, SqlValidationError, SqlValidationSummary};
