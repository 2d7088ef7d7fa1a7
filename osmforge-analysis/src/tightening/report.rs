//! Decision log model — the `decision-log.json` payload.

use serde::{Deserialize, Serialize};
use serde_json::json;

use osmforge_core::config::TighteningToggleSnapshot;

use super::types::PolicyDecisionSet;

/// One decision record, flattened for the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub kind: String,
    pub target: String,
    pub outcome: String,
    pub rationale: String,
}

/// The ordered decision log plus the toggle snapshot that produced it.
#[derive(Debug, Clone)]
pub struct PolicyDecisionReport {
    pub records: Vec<DecisionRecord>,
    pub toggle_snapshot: TighteningToggleSnapshot,
}

impl PolicyDecisionReport {
    /// Flatten a decision set into the log model. Record order follows the
    /// decision maps, which are sorted by coordinate.
    pub fn from_decisions(set: &PolicyDecisionSet) -> Self {
        let mut records = Vec::new();

        for decision in set.nullability.values() {
            records.push(DecisionRecord {
                kind: "nullability".to_string(),
                target: decision.column.to_string(),
                outcome: if decision.make_not_null {
                    "NOT NULL".to_string()
                } else {
                    "keep nullable".to_string()
                },
                rationale: decision.rationale.clone(),
            });
        }
        for decision in set.uniqueness.values() {
            records.push(DecisionRecord {
                kind: "uniqueIndex".to_string(),
                target: decision.index.to_string(),
                outcome: if decision.enforce {
                    "enforce".to_string()
                } else {
                    "skip".to_string()
                },
                rationale: decision.rationale.clone(),
            });
        }
        for decision in set.foreign_keys.values() {
            records.push(DecisionRecord {
                kind: "foreignKey".to_string(),
                target: decision.relationship.to_string(),
                outcome: if decision.create_constraint {
                    format!("create (ON DELETE {})", decision.action.as_sql())
                } else {
                    "skip".to_string()
                },
                rationale: decision.rationale.clone(),
            });
        }

        Self {
            records,
            toggle_snapshot: set.toggles.clone(),
        }
    }

    /// Serialize as a JSON array of decisions with a trailing toggle block.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut elements: Vec<serde_json::Value> = self
            .records
            .iter()
            .map(|r| serde_json::to_value(r).unwrap_or_else(|_| json!({})))
            .collect();
        elements.push(json!({ "toggleSnapshot": self.toggle_snapshot.entries }));
        serde_json::to_string_pretty(&elements)
    }
}
