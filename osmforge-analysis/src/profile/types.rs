//! Profile snapshot — runtime evidence captured from the target database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use osmforge_core::types::{ColumnName, RelationshipConstraintKey, SchemaName, TableName};

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ProbeStatus {
    #[serde(rename_all = "camelCase")]
    Succeeded {
        at_utc: DateTime<Utc>,
        sampled: bool,
    },
    Skipped {
        reason: String,
    },
    Failed {
        reason: String,
    },
}

impl ProbeStatus {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Default status for evidence implied by its presence in the snapshot.
    pub fn witnessed() -> Self {
        Self::Succeeded {
            at_utc: DateTime::UNIX_EPOCH,
            sampled: false,
        }
    }
}

/// Evidence for one physical column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub schema: SchemaName,
    pub table: TableName,
    pub column: ColumnName,
    pub is_nullable_physical: bool,
    pub is_computed: bool,
    pub is_primary_key: bool,
    pub is_unique_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_definition: Option<String>,
    pub row_count: u64,
    pub null_count: u64,
    pub probe_status: ProbeStatus,
}

/// Evidence for a single-column uniqueness candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueCandidate {
    pub schema: SchemaName,
    pub table: TableName,
    pub column: ColumnName,
    pub has_duplicate: bool,
    pub probe_status: ProbeStatus,
}

/// Evidence for a composite uniqueness candidate. Candidates may arrive as
/// bare column sets; a listed candidate defaults to a clean witness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeUniqueCandidate {
    pub schema: SchemaName,
    pub table: TableName,
    pub columns: Vec<ColumnName>,
    #[serde(default)]
    pub has_duplicate: bool,
    #[serde(default = "ProbeStatus::witnessed")]
    pub probe_status: ProbeStatus,
}

/// Evidence for a foreign-key reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyReality {
    pub reference: RelationshipConstraintKey,
    pub has_orphan: bool,
    pub is_no_check: bool,
    pub probe_status: ProbeStatus,
}

/// The full profile snapshot: four parallel evidence sequences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub columns: Vec<ColumnProfile>,
    #[serde(default)]
    pub unique_candidates: Vec<UniqueCandidate>,
    #[serde(default)]
    pub composite_unique_candidates: Vec<CompositeUniqueCandidate>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyReality>,
}

impl ProfileSnapshot {
    /// Evidence for one column, when the snapshot has it.
    pub fn column(
        &self,
        schema: &SchemaName,
        table: &TableName,
        column: &ColumnName,
    ) -> Option<&ColumnProfile> {
        self.columns
            .iter()
            .find(|c| &c.schema == schema && &c.table == table && &c.column == column)
    }

    /// Reality row for one constraint key, when the snapshot has it.
    pub fn foreign_key(&self, key: &RelationshipConstraintKey) -> Option<&ForeignKeyReality> {
        self.foreign_keys.iter().find(|f| &f.reference == key)
    }
}
