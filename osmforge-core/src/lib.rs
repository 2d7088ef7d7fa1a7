//! Core building blocks for the osmforge pipeline.
//!
//! Subsystems:
//! - `types` — validated case-insensitive names and physical coordinates
//! - `errors` — per-subsystem error enums, stable error codes, accumulation
//! - `config` — option structs, TOML overlay, toggle precedence
//! - `events` — append-only execution log with stable step names
//! - `tracing` — logging bootstrap
//! - `cancel` — cooperative cancellation token

pub mod cancel;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod types;

pub use cancel::{CancelToken, Context};
pub use errors::{ErrorCode, ValidationError};
pub use events::{ExecutionLog, LogEntry};
