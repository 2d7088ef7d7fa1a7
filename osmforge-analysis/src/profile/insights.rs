//! Evidence insights — deterministic observations over a profile snapshot.

use serde::{Deserialize, Serialize};

use super::types::{ProbeStatus, ProfileSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightSeverity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightCategory {
    Evidence,
    Uniqueness,
    ForeignKey,
    Probe,
}

/// One observation derived from the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilingInsight {
    pub severity: InsightSeverity,
    pub category: InsightCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<String>,
}

/// Derive the ordered insight sequence for a snapshot.
/// Deterministic: same snapshot, same insights in the same order.
pub fn derive_insights(snapshot: &ProfileSnapshot) -> Vec<ProfilingInsight> {
    let mut insights = Vec::new();

    for column in &snapshot.columns {
        let coordinate = format!("{}.{}.{}", column.schema, column.table, column.column);
        if column.null_count == 0 && !column.is_nullable_physical {
            insights.push(ProfilingInsight {
                severity: InsightSeverity::Info,
                category: InsightCategory::Evidence,
                message: format!(
                    "column {coordinate} is already NOT NULL and evidence shows zero nulls over {} rows",
                    column.row_count
                ),
                coordinate: Some(coordinate),
            });
        } else if let ProbeStatus::Failed { reason } = &column.probe_status {
            insights.push(ProfilingInsight {
                severity: InsightSeverity::Warning,
                category: InsightCategory::Probe,
                message: format!("column probe failed for {coordinate}: {reason}"),
                coordinate: Some(coordinate),
            });
        }
    }

    for candidate in &snapshot.unique_candidates {
        let coordinate = format!(
            "{}.{}.{}",
            candidate.schema, candidate.table, candidate.column
        );
        if !candidate.has_duplicate && candidate.probe_status.succeeded() {
            insights.push(ProfilingInsight {
                severity: InsightSeverity::Info,
                category: InsightCategory::Uniqueness,
                message: format!("no duplicate values observed for {coordinate}"),
                coordinate: Some(coordinate),
            });
        } else if let ProbeStatus::Failed { reason } = &candidate.probe_status {
            insights.push(ProfilingInsight {
                severity: InsightSeverity::Warning,
                category: InsightCategory::Probe,
                message: format!("uniqueness probe failed for {coordinate}: {reason}"),
                coordinate: Some(coordinate),
            });
        }
    }

    for candidate in &snapshot.composite_unique_candidates {
        if !candidate.has_duplicate && candidate.probe_status.succeeded() {
            let columns = candidate
                .columns
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            insights.push(ProfilingInsight {
                severity: InsightSeverity::Info,
                category: InsightCategory::Uniqueness,
                message: format!(
                    "no duplicate combinations observed for {}.{} ({columns})",
                    candidate.schema, candidate.table
                ),
                coordinate: Some(format!("{}.{}", candidate.schema, candidate.table)),
            });
        }
    }

    for reality in &snapshot.foreign_keys {
        let coordinate = reality.reference.to_string();
        if reality.has_orphan {
            insights.push(ProfilingInsight {
                severity: InsightSeverity::Warning,
                category: InsightCategory::ForeignKey,
                message: format!("orphan rows observed behind constraint {coordinate}"),
                coordinate: Some(coordinate.clone()),
            });
        }
        if reality.is_no_check {
            insights.push(ProfilingInsight {
                severity: InsightSeverity::Warning,
                category: InsightCategory::ForeignKey,
                message: format!("constraint {coordinate} is marked WITH NOCHECK"),
                coordinate: Some(coordinate),
            });
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::types::{ColumnProfile, ForeignKeyReality, UniqueCandidate};
    use chrono::DateTime;
    use osmforge_core::types::{
        ColumnName, RelationshipConstraintKey, SchemaName, TableName,
    };

    fn succeeded() -> ProbeStatus {
        ProbeStatus::Succeeded {
            at_utc: DateTime::UNIX_EPOCH,
            sampled: false,
        }
    }

    #[test]
    fn insights_cover_evidence_uniqueness_and_fk_reality() {
        let snapshot = ProfileSnapshot {
            columns: vec![ColumnProfile {
                schema: SchemaName::dbo(),
                table: TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
                column: ColumnName::new("EMAIL").unwrap(),
                is_nullable_physical: false,
                is_computed: false,
                is_primary_key: false,
                is_unique_key: false,
                default_definition: None,
                row_count: 100,
                null_count: 0,
                probe_status: succeeded(),
            }],
            unique_candidates: vec![UniqueCandidate {
                schema: SchemaName::dbo(),
                table: TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
                column: ColumnName::new("EMAIL").unwrap(),
                has_duplicate: false,
                probe_status: succeeded(),
            }],
            composite_unique_candidates: vec![],
            foreign_keys: vec![ForeignKeyReality {
                reference: RelationshipConstraintKey::new(
                    SchemaName::dbo(),
                    TableName::new("OSUSR_ABC_ORDER").unwrap(),
                    ColumnName::new("FK_ORDER_CUSTOMER").unwrap(),
                ),
                has_orphan: true,
                is_no_check: false,
                probe_status: succeeded(),
            }],
        };

        let insights = derive_insights(&snapshot);
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].category, InsightCategory::Evidence);
        assert_eq!(insights[1].category, InsightCategory::Uniqueness);
        assert_eq!(insights[2].category, InsightCategory::ForeignKey);
        assert_eq!(insights[2].severity, InsightSeverity::Warning);
    }

    #[test]
    fn derivation_is_deterministic() {
        let snapshot = ProfileSnapshot::default();
        assert_eq!(derive_insights(&snapshot).len(), 0);
    }
}
