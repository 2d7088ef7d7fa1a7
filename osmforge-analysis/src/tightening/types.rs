//! Decision records produced by the policy engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use osmforge_core::config::TighteningToggleSnapshot;
use osmforge_core::types::{ColumnCoordinate, IndexCoordinate, RelationshipConstraintKey};

/// Per-column nullability decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NullabilityDecision {
    pub column: ColumnCoordinate,
    pub make_not_null: bool,
    pub rationale: String,
}

/// Per-index uniqueness decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueIndexDecision {
    pub index: IndexCoordinate,
    pub enforce: bool,
    pub rationale: String,
}

/// Referential action for an emitted foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
}

impl ForeignKeyAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
        }
    }

    /// Map an extraction delete-rule code onto a referential action.
    pub fn from_delete_rule(code: Option<&str>) -> Self {
        match code.map(|c| c.to_ascii_lowercase()) {
            Some(ref c) if c == "cascade" || c == "delete" => Self::Cascade,
            Some(ref c) if c == "set null" || c == "setnull" => Self::SetNull,
            _ => Self::NoAction,
        }
    }
}

/// Per-relationship foreign key decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyDecision {
    pub relationship: RelationshipConstraintKey,
    pub create_constraint: bool,
    pub action: ForeignKeyAction,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Info,
    Warning,
}

/// Non-fatal signal collected while deciding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TighteningDiagnostic {
    pub code: String,
    pub severity: DiagnosticSeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<String>,
}

/// The full decision set for one run.
#[derive(Debug, Clone, Default)]
pub struct PolicyDecisionSet {
    pub nullability: BTreeMap<ColumnCoordinate, NullabilityDecision>,
    pub uniqueness: BTreeMap<IndexCoordinate, UniqueIndexDecision>,
    pub foreign_keys: BTreeMap<RelationshipConstraintKey, ForeignKeyDecision>,
    pub diagnostics: Vec<TighteningDiagnostic>,
    /// Entity logical name → identifier column.
    pub identity_map: BTreeMap<String, String>,
    /// Physical table → effective table, for overridden names only.
    pub rename_map: BTreeMap<String, String>,
    pub toggles: TighteningToggleSnapshot,
}

impl PolicyDecisionSet {
    /// Count summary for the manifest's policy block.
    pub fn summary(&self) -> BTreeMap<String, usize> {
        let mut summary = BTreeMap::new();
        summary.insert(
            "nullability.tightened".to_string(),
            self.nullability.values().filter(|d| d.make_not_null).count(),
        );
        summary.insert(
            "uniqueness.enforced".to_string(),
            self.uniqueness.values().filter(|d| d.enforce).count(),
        );
        summary.insert(
            "foreignKeys.created".to_string(),
            self.foreign_keys
                .values()
                .filter(|d| d.create_constraint)
                .count(),
        );
        summary.insert("diagnostics".to_string(), self.diagnostics.len());
        summary
    }

    /// Whether a column should be emitted NOT NULL.
    pub fn wants_not_null(&self, column: &ColumnCoordinate) -> bool {
        self.nullability
            .get(column)
            .map(|d| d.make_not_null)
            .unwrap_or(false)
    }
}
