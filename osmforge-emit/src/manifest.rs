//! The emission manifest and its digest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use osmforge_core::constants::EMISSION_DIGEST_ALGORITHM;

/// One emitted table in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableManifestEntry {
    pub module: String,
    pub schema: String,
    pub logical_name: String,
    pub table_file: String,
    pub pre_remediation_files: Vec<String>,
    pub post_remediation_files: Vec<String>,
    pub is_external: bool,
}

/// Digest block: algorithm plus the emission digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionBlock {
    pub algorithm: String,
    pub digest: String,
}

/// Entity/attribute coverage counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageBlock {
    pub modules: usize,
    pub entities: usize,
    pub attributes: usize,
}

/// Evidence coverage counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateCoverageBlock {
    pub profiled_columns: usize,
    pub decided_columns: usize,
}

/// `manifest.json` — stable key order, bit-identical across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsdtManifest {
    pub options: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_summary: Option<BTreeMap<String, usize>>,
    pub emission: EmissionBlock,
    pub tables: Vec<TableManifestEntry>,
    pub pre_remediation: Vec<String>,
    pub coverage: CoverageBlock,
    pub predicate_coverage: PredicateCoverageBlock,
    pub unsupported: Vec<String>,
}

impl SsdtManifest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// SHA-256 over the sorted `(tableFile, contentHash)` sequence,
/// as a 64-character lowercase hex string.
pub fn compute_emission_digest(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut hasher = Sha256::new();
    for (file, hash) in sorted {
        hasher.update(file.as_bytes());
        hasher.update(b"\n");
        hasher.update(hash.as_bytes());
        hasher.update(b"\n");
    }
    hex_lower(&hasher.finalize())
}

/// Lowercase hex SHA-256 of content bytes.
pub fn content_sha256(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex_lower(&hasher.finalize())
}

pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// The `emission` block for a digest value.
pub fn emission_block(digest: String) -> EmissionBlock {
    EmissionBlock {
        algorithm: EMISSION_DIGEST_ALGORITHM.to_string(),
        digest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_order_independent_and_stable() {
        let forward = vec![
            ("a.sql".to_string(), "h1".to_string()),
            ("b.sql".to_string(), "h2".to_string()),
        ];
        let reversed = vec![
            ("b.sql".to_string(), "h2".to_string()),
            ("a.sql".to_string(), "h1".to_string()),
        ];
        let digest = compute_emission_digest(&forward);
        assert_eq!(digest, compute_emission_digest(&reversed));
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn digest_changes_with_content() {
        let a = vec![("a.sql".to_string(), "h1".to_string())];
        let b = vec![("a.sql".to_string(), "h2".to_string())];
        assert_ne!(compute_emission_digest(&a), compute_emission_digest(&b));
    }
}
