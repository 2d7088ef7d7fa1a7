//! Execution log — append-only structured step log.

pub mod log;
pub mod steps;

pub use log::{ExecutionLog, LogEntry, Metadata};
