//! Append-only execution log with metadata dictionaries.
//!
//! Metadata keys follow the `counts.*`, `paths.*`, `flags.*`, `metrics.*`,
//! `timestamps.*` families. Entries are mirrored to `tracing` as they land.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Builder for a metadata dictionary with the conventional key families.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn count(self, name: &str, value: usize) -> Self {
        self.entry(format!("counts.{name}"), value.to_string())
    }

    pub fn path(self, name: &str, value: impl AsRef<Path>) -> Self {
        self.entry(
            format!("paths.{name}"),
            value.as_ref().display().to_string(),
        )
    }

    pub fn flag(self, name: &str, value: bool) -> Self {
        self.entry(format!("flags.{name}"), value.to_string())
    }

    pub fn metric(self, name: &str, value: impl ToString) -> Self {
        self.entry(format!("metrics.{name}"), value.to_string())
    }

    pub fn timestamp(self, name: &str, value: DateTime<Utc>) -> Self {
        self.entry(format!("timestamps.{name}"), value.to_rfc3339())
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }
}

/// One log entry: when, which step, and its metadata dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub step: String,
    pub metadata: BTreeMap<String, String>,
}

/// Ordered, append-only step log for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub entries: Vec<LogEntry>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, stamping it with the current UTC time.
    pub fn record(&mut self, step: &str, metadata: Metadata) {
        self.record_at(step, metadata, Utc::now());
    }

    /// Append an entry with an explicit timestamp (used by tests and replay).
    pub fn record_at(&mut self, step: &str, metadata: Metadata, timestamp: DateTime<Utc>) {
        let metadata = metadata.into_map();
        tracing::info!(step, ?metadata, "pipeline step");
        self.entries.push(LogEntry {
            timestamp,
            step: step.to_string(),
            metadata,
        });
    }

    /// Entries for one step, in insertion order.
    pub fn entries_for(&self, step: &str) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.step == step).collect()
    }

    pub fn contains_step(&self, step: &str) -> bool {
        self.entries.iter().any(|e| e.step == step)
    }

    /// Serialize the log to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }

    /// Persist as `execution-log.json` under the given directory.
    pub fn persist(&self, output_dir: &Path) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(output_dir.join("execution-log.json"), json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::steps;

    #[test]
    fn entries_preserve_order_and_metadata_families() {
        let mut log = ExecutionLog::new();
        log.record(
            steps::MODEL_INGESTED,
            Metadata::new().count("modules", 3).flag("filtered", false),
        );
        log.record(steps::MODEL_FILTERED, Metadata::new().count("modules", 2));

        assert_eq!(log.entries.len(), 2);
        assert_eq!(log.entries[0].step, "model.ingested");
        assert_eq!(log.entries[0].metadata["counts.modules"], "3");
        assert_eq!(log.entries[0].metadata["flags.filtered"], "false");
        assert!(log.contains_step("model.filtered"));
    }

    #[test]
    fn persist_writes_execution_log_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ExecutionLog::new();
        log.record(steps::REQUEST_RECEIVED, Metadata::new());
        log.persist(dir.path()).unwrap();
        let written =
            std::fs::read_to_string(dir.path().join("execution-log.json")).unwrap();
        assert!(written.contains("request.received"));
    }
}
