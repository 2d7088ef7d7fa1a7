//! The tightening decision rules.
//!
//! Evidence only ever tightens: absent or unusable evidence leaves the
//! modeled schema untouched and produces diagnostics instead of decisions.

use chrono::{DateTime, Utc};

use osmforge_core::config::toggles::{
    TOGGLE_POLICY_COMPOSITE_UNIQUE, TOGGLE_POLICY_MODE, TOGGLE_POLICY_NULL_BUDGET,
};
use osmforge_core::config::{PolicyMode, TighteningOptions, TighteningToggleSnapshot};
use osmforge_core::types::{ColumnCoordinate, ColumnName, IndexCoordinate};

use crate::model::type_map::physical_type_for;
use crate::model::{Attribute, Entity, OsmModel};
use crate::naming::EffectiveNameResolver;
use crate::profile::{ProbeStatus, ProfileSnapshot};

use super::opportunities::{
    OpportunitiesReport, Opportunity, OpportunityCategory, OpportunityDisposition, RiskLevel,
};
use super::sqlgen;
use super::types::{
    DiagnosticSeverity, ForeignKeyAction, ForeignKeyDecision, NullabilityDecision,
    PolicyDecisionSet, TighteningDiagnostic, UniqueIndexDecision,
};

/// Evidence-driven policy engine.
pub struct TighteningPolicyEngine {
    options: TighteningOptions,
    toggles: TighteningToggleSnapshot,
}

impl TighteningPolicyEngine {
    pub fn new(options: TighteningOptions, toggles: TighteningToggleSnapshot) -> Self {
        Self { options, toggles }
    }

    /// Synthesize decisions and opportunities for the filtered model.
    pub fn decide(
        &self,
        model: &OsmModel,
        profile: &ProfileSnapshot,
        resolver: &EffectiveNameResolver,
        generated_at_utc: DateTime<Utc>,
    ) -> (PolicyDecisionSet, OpportunitiesReport) {
        let mut set = PolicyDecisionSet {
            toggles: self.toggles.clone(),
            ..Default::default()
        };
        let mut opportunities = Vec::new();

        for entity in model.entities() {
            self.decide_nullability(entity, profile, &mut set, &mut opportunities);
            if let Some(identifier) = entity.identifier() {
                set.identity_map.insert(
                    entity.logical_name.as_str().to_string(),
                    identifier.column_name.as_str().to_string(),
                );
            }
        }

        self.decide_uniqueness(model, profile, &mut set, &mut opportunities);

        for entity in model.entities() {
            self.decide_foreign_keys(entity, profile, &mut set, &mut opportunities);
        }

        for (physical, effective) in resolver.renames() {
            set.rename_map.insert(
                physical.as_str().to_string(),
                effective.as_str().to_string(),
            );
        }

        let report = OpportunitiesReport::assemble(opportunities, generated_at_utc);
        (set, report)
    }

    fn tightening_allowed(&self) -> bool {
        matches!(
            self.options.mode,
            PolicyMode::EvidenceGated | PolicyMode::Aggressive
        )
    }

    fn mode_rationale(&self) -> String {
        self.toggles.describe(TOGGLE_POLICY_MODE)
    }

    fn decide_nullability(
        &self,
        entity: &Entity,
        profile: &ProfileSnapshot,
        set: &mut PolicyDecisionSet,
        opportunities: &mut Vec<Opportunity>,
    ) {
        let mut remediation_proposals: u32 = 0;
        let mut budget_diagnostic_emitted = false;

        for attribute in &entity.attributes {
            let coordinate = ColumnCoordinate::new(
                entity.schema.clone(),
                entity.table_name.clone(),
                attribute.column_name.clone(),
            );
            let Some(evidence) =
                profile.column(&entity.schema, &entity.table_name, &attribute.column_name)
            else {
                continue;
            };

            match &evidence.probe_status {
                ProbeStatus::Succeeded { .. } => {}
                ProbeStatus::Skipped { reason } => {
                    set.diagnostics.push(TighteningDiagnostic {
                        code: "policy.probe.unavailable".to_string(),
                        severity: DiagnosticSeverity::Info,
                        message: format!("profile skipped for {coordinate}: {reason}"),
                        coordinate: Some(coordinate.to_string()),
                    });
                    opportunities.push(coverage_opportunity(&coordinate.to_string(), reason));
                    continue;
                }
                ProbeStatus::Failed { reason } => {
                    set.diagnostics.push(TighteningDiagnostic {
                        code: "policy.probe.unavailable".to_string(),
                        severity: DiagnosticSeverity::Warning,
                        message: format!("profile probe failed for {coordinate}: {reason}"),
                        coordinate: Some(coordinate.to_string()),
                    });
                    opportunities.push(coverage_opportunity(&coordinate.to_string(), reason));
                    continue;
                }
            }

            let tightenable =
                evidence.null_count == 0 && !evidence.is_computed && evidence.is_nullable_physical;

            if tightenable {
                let rationale = format!(
                    "zero nulls over {} rows; {}",
                    evidence.row_count,
                    self.mode_rationale()
                );
                let safe_sql = sqlgen::alter_not_null(
                    &entity.schema,
                    &entity.table_name,
                    &attribute.column_name,
                    &physical_type_for(attribute),
                );
                if self.tightening_allowed() {
                    set.nullability.insert(
                        coordinate.clone(),
                        NullabilityDecision {
                            column: coordinate.clone(),
                            make_not_null: true,
                            rationale: rationale.clone(),
                        },
                    );
                    opportunities.push(Opportunity {
                        id: String::new(),
                        category: OpportunityCategory::Tightening,
                        kind: "nullability.tighten".to_string(),
                        disposition: OpportunityDisposition::Safe,
                        risk: RiskLevel::Low,
                        target: coordinate.to_string(),
                        rationale,
                        remediation_sql: None,
                        safe_sql: Some(safe_sql),
                    });
                } else {
                    opportunities.push(Opportunity {
                        id: String::new(),
                        category: OpportunityCategory::Tightening,
                        kind: "nullability.tighten".to_string(),
                        disposition: OpportunityDisposition::Informational,
                        risk: RiskLevel::Low,
                        target: coordinate.to_string(),
                        rationale,
                        remediation_sql: None,
                        safe_sql: None,
                    });
                }
                continue;
            }

            // Logical model demands NOT NULL but the data disagrees.
            if attribute.is_mandatory && evidence.null_count > 0 {
                remediation_proposals += 1;
                if remediation_proposals > self.options.null_budget {
                    if !budget_diagnostic_emitted {
                        set.diagnostics.push(TighteningDiagnostic {
                            code: "policy.budget.exceeded".to_string(),
                            severity: DiagnosticSeverity::Warning,
                            message: format!(
                                "entity '{}' exceeded the null budget; further remediation proposals suppressed ({})",
                                entity.logical_name,
                                self.toggles.describe(TOGGLE_POLICY_NULL_BUDGET)
                            ),
                            coordinate: Some(coordinate.to_string()),
                        });
                        budget_diagnostic_emitted = true;
                    }
                    continue;
                }

                let rationale = format!(
                    "attribute is mandatory but {} of {} rows are null; {}",
                    evidence.null_count,
                    evidence.row_count,
                    self.mode_rationale()
                );
                let backfill = sqlgen::backfill_nulls(
                    &entity.schema,
                    &entity.table_name,
                    &attribute.column_name,
                    &default_literal_for(attribute),
                );
                let alter = sqlgen::alter_not_null(
                    &entity.schema,
                    &entity.table_name,
                    &attribute.column_name,
                    &physical_type_for(attribute),
                );
                set.nullability.insert(
                    coordinate.clone(),
                    NullabilityDecision {
                        column: coordinate.clone(),
                        make_not_null: false,
                        rationale: rationale.clone(),
                    },
                );
                opportunities.push(Opportunity {
                    id: String::new(),
                    category: OpportunityCategory::Contradiction,
                    kind: "nullability.contradiction".to_string(),
                    disposition: OpportunityDisposition::NeedsRemediation,
                    risk: RiskLevel::High,
                    target: coordinate.to_string(),
                    rationale,
                    remediation_sql: Some(format!("{backfill}\n{alter}")),
                    safe_sql: None,
                });
            }
        }
    }

    fn decide_uniqueness(
        &self,
        model: &OsmModel,
        profile: &ProfileSnapshot,
        set: &mut PolicyDecisionSet,
        opportunities: &mut Vec<Opportunity>,
    ) {
        for candidate in &profile.unique_candidates {
            let Some(entity) = model
                .entities()
                .find(|e| e.schema == candidate.schema && e.table_name == candidate.table)
            else {
                continue;
            };

            let coordinate = format!(
                "{}.{}.{}",
                candidate.schema, candidate.table, candidate.column
            );

            match &candidate.probe_status {
                ProbeStatus::Succeeded { .. } => {}
                ProbeStatus::Skipped { reason } | ProbeStatus::Failed { reason } => {
                    set.diagnostics.push(TighteningDiagnostic {
                        code: "policy.probe.unavailable".to_string(),
                        severity: DiagnosticSeverity::Info,
                        message: format!("uniqueness probe unavailable for {coordinate}: {reason}"),
                        coordinate: Some(coordinate),
                    });
                    continue;
                }
            }

            let model_index = entity.indexes.iter().find(|i| {
                i.columns.len() == 1 && i.columns[0] == candidate.column
            });
            let index_name = model_index
                .map(|i| i.name.as_str().to_string())
                .unwrap_or_else(|| {
                    format!("UX_{}_{}", candidate.table.as_str(), candidate.column.as_str())
                });
            let Ok(index_column) = ColumnName::new(&index_name) else {
                continue;
            };
            let index_coordinate = IndexCoordinate::new(
                candidate.schema.clone(),
                candidate.table.clone(),
                index_column,
            );

            if !candidate.has_duplicate {
                let rationale = format!(
                    "no duplicates observed for {}; {}",
                    candidate.column,
                    self.mode_rationale()
                );
                let safe_sql = sqlgen::create_unique_index(
                    &index_name,
                    &candidate.schema,
                    &candidate.table,
                    &[&candidate.column],
                );
                if self.tightening_allowed() {
                    set.uniqueness.insert(
                        index_coordinate.clone(),
                        UniqueIndexDecision {
                            index: index_coordinate.clone(),
                            enforce: true,
                            rationale: rationale.clone(),
                        },
                    );
                    opportunities.push(Opportunity {
                        id: String::new(),
                        category: OpportunityCategory::Tightening,
                        kind: "uniqueness.enforce".to_string(),
                        disposition: OpportunityDisposition::Safe,
                        risk: RiskLevel::Low,
                        target: index_coordinate.to_string(),
                        rationale,
                        remediation_sql: None,
                        safe_sql: Some(safe_sql),
                    });
                } else {
                    opportunities.push(Opportunity {
                        id: String::new(),
                        category: OpportunityCategory::Tightening,
                        kind: "uniqueness.enforce".to_string(),
                        disposition: OpportunityDisposition::Informational,
                        risk: RiskLevel::Low,
                        target: index_coordinate.to_string(),
                        rationale,
                        remediation_sql: None,
                        safe_sql: None,
                    });
                }
            } else if model_index.map(|i| i.is_unique).unwrap_or(false) {
                // The model declares uniqueness the data does not have.
                let rationale = format!(
                    "index '{index_name}' is modeled unique but duplicates exist; {}",
                    self.mode_rationale()
                );
                set.uniqueness.insert(
                    index_coordinate.clone(),
                    UniqueIndexDecision {
                        index: index_coordinate.clone(),
                        enforce: false,
                        rationale: rationale.clone(),
                    },
                );
                opportunities.push(Opportunity {
                    id: String::new(),
                    category: OpportunityCategory::Contradiction,
                    kind: "uniqueness.contradiction".to_string(),
                    disposition: OpportunityDisposition::NeedsRemediation,
                    risk: RiskLevel::High,
                    target: index_coordinate.to_string(),
                    rationale,
                    remediation_sql: Some(sqlgen::list_duplicates(
                        &candidate.schema,
                        &candidate.table,
                        &candidate.column,
                    )),
                    safe_sql: None,
                });
            }
        }

        if self.options.effective_enforce_composite_unique() {
            for candidate in &profile.composite_unique_candidates {
                if candidate.has_duplicate || !candidate.probe_status.succeeded() {
                    continue;
                }
                let in_model = model
                    .entities()
                    .any(|e| e.schema == candidate.schema && e.table_name == candidate.table);
                if !in_model || candidate.columns.is_empty() {
                    continue;
                }
                let suffix = candidate
                    .columns
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join("_");
                let index_name = format!("UX_{}_{}", candidate.table.as_str(), suffix);
                let Ok(index_column) = ColumnName::new(&index_name) else {
                    continue;
                };
                let index_coordinate = IndexCoordinate::new(
                    candidate.schema.clone(),
                    candidate.table.clone(),
                    index_column,
                );
                let rationale = format!(
                    "no duplicate combinations observed; {}",
                    self.toggles.describe(TOGGLE_POLICY_COMPOSITE_UNIQUE)
                );
                let columns: Vec<&ColumnName> = candidate.columns.iter().collect();
                set.uniqueness.insert(
                    index_coordinate.clone(),
                    UniqueIndexDecision {
                        index: index_coordinate.clone(),
                        enforce: true,
                        rationale: rationale.clone(),
                    },
                );
                opportunities.push(Opportunity {
                    id: String::new(),
                    category: OpportunityCategory::Tightening,
                    kind: "uniqueness.composite".to_string(),
                    disposition: OpportunityDisposition::Safe,
                    risk: RiskLevel::Medium,
                    target: index_coordinate.to_string(),
                    rationale,
                    remediation_sql: None,
                    safe_sql: Some(sqlgen::create_unique_index(
                        &index_name,
                        &candidate.schema,
                        &candidate.table,
                        &columns,
                    )),
                });
            }
        }
    }

    fn decide_foreign_keys(
        &self,
        entity: &Entity,
        profile: &ProfileSnapshot,
        set: &mut PolicyDecisionSet,
        opportunities: &mut Vec<Opportunity>,
    ) {
        for relationship in &entity.relationships {
            if !relationship.has_database_constraint {
                continue;
            }
            for constraint in &relationship.actual_constraints {
                let Some(key) = constraint.key(&entity.schema, &entity.table_name) else {
                    continue;
                };
                if !constraint.is_hydrated() {
                    set.diagnostics.push(TighteningDiagnostic {
                        code: "policy.constraint.skipped".to_string(),
                        severity: DiagnosticSeverity::Info,
                        message: format!(
                            "constraint '{}' has no hydrated columns and was skipped",
                            key.constraint_name
                        ),
                        coordinate: Some(key.to_string()),
                    });
                    continue;
                }

                let Some(reality) = profile.foreign_key(&key) else {
                    set.diagnostics.push(TighteningDiagnostic {
                        code: "policy.probe.unavailable".to_string(),
                        severity: DiagnosticSeverity::Info,
                        message: format!(
                            "no foreign key evidence for '{}'; constraint left as modeled",
                            key.constraint_name
                        ),
                        coordinate: Some(key.to_string()),
                    });
                    continue;
                };

                let action = ForeignKeyAction::from_delete_rule(
                    relationship.delete_rule_code.as_deref(),
                );
                let referenced_schema = constraint
                    .referenced_schema
                    .clone()
                    .unwrap_or_else(|| entity.schema.clone());
                let referenced_table = constraint
                    .referenced_table
                    .clone()
                    .unwrap_or_else(|| relationship.to_table.clone());

                let owner_columns: Vec<&ColumnName> = constraint
                    .columns
                    .iter()
                    .filter_map(|c| c.owner_column.as_ref())
                    .collect();
                let referenced_columns: Vec<&ColumnName> = constraint
                    .columns
                    .iter()
                    .filter_map(|c| c.referenced_column.as_ref())
                    .collect();

                if reality.has_orphan {
                    let rationale = format!(
                        "orphan rows observed behind '{}'; {}",
                        key.constraint_name,
                        self.mode_rationale()
                    );
                    let remediation = owner_columns
                        .first()
                        .zip(referenced_columns.first())
                        .map(|(owner, referenced)| {
                            sqlgen::delete_orphans(
                                &entity.schema,
                                &entity.table_name,
                                owner,
                                &referenced_schema,
                                &referenced_table,
                                referenced,
                            )
                        });
                    set.foreign_keys.insert(
                        key.clone(),
                        ForeignKeyDecision {
                            relationship: key.clone(),
                            create_constraint: false,
                            action,
                            rationale: rationale.clone(),
                        },
                    );
                    opportunities.push(Opportunity {
                        id: String::new(),
                        category: OpportunityCategory::Contradiction,
                        kind: "foreignKey.orphans".to_string(),
                        disposition: OpportunityDisposition::NeedsRemediation,
                        risk: RiskLevel::High,
                        target: key.to_string(),
                        rationale,
                        remediation_sql: remediation,
                        safe_sql: None,
                    });
                } else if reality.is_no_check {
                    let rationale = format!(
                        "constraint '{}' exists WITH NOCHECK; re-checking is a manual call",
                        key.constraint_name
                    );
                    set.foreign_keys.insert(
                        key.clone(),
                        ForeignKeyDecision {
                            relationship: key.clone(),
                            create_constraint: true,
                            action,
                            rationale: rationale.clone(),
                        },
                    );
                    opportunities.push(Opportunity {
                        id: String::new(),
                        category: OpportunityCategory::Tightening,
                        kind: "foreignKey.nocheck".to_string(),
                        disposition: OpportunityDisposition::Informational,
                        risk: RiskLevel::Medium,
                        target: key.to_string(),
                        rationale,
                        remediation_sql: None,
                        safe_sql: None,
                    });
                } else if reality.probe_status.succeeded() {
                    let rationale = format!(
                        "no orphans observed behind '{}'; {}",
                        key.constraint_name,
                        self.mode_rationale()
                    );
                    let create = self.tightening_allowed();
                    let safe_sql = create.then(|| {
                        sqlgen::add_foreign_key(
                            &entity.schema,
                            &entity.table_name,
                            key.constraint_name.as_str(),
                            &owner_columns,
                            &referenced_schema,
                            &referenced_table,
                            &referenced_columns,
                            action,
                        )
                    });
                    set.foreign_keys.insert(
                        key.clone(),
                        ForeignKeyDecision {
                            relationship: key.clone(),
                            create_constraint: create,
                            action,
                            rationale: rationale.clone(),
                        },
                    );
                    opportunities.push(Opportunity {
                        id: String::new(),
                        category: OpportunityCategory::Tightening,
                        kind: "foreignKey.enforce".to_string(),
                        disposition: if create {
                            OpportunityDisposition::Safe
                        } else {
                            OpportunityDisposition::Informational
                        },
                        risk: RiskLevel::Low,
                        target: key.to_string(),
                        rationale,
                        remediation_sql: None,
                        safe_sql,
                    });
                } else if let ProbeStatus::Skipped { reason } | ProbeStatus::Failed { reason } =
                    &reality.probe_status
                {
                    // No decision, but the coverage gap must surface like
                    // every other evidence category.
                    set.diagnostics.push(TighteningDiagnostic {
                        code: "policy.probe.unavailable".to_string(),
                        severity: DiagnosticSeverity::Warning,
                        message: format!(
                            "foreign key probe unavailable for '{}': {reason}; constraint left as modeled",
                            key.constraint_name
                        ),
                        coordinate: Some(key.to_string()),
                    });
                }
            }
        }
    }
}

fn coverage_opportunity(target: &str, reason: &str) -> Opportunity {
    Opportunity {
        id: String::new(),
        category: OpportunityCategory::Coverage,
        kind: "coverage.probe".to_string(),
        disposition: OpportunityDisposition::Informational,
        risk: RiskLevel::Medium,
        target: target.to_string(),
        rationale: format!("probe produced no usable evidence: {reason}"),
        remediation_sql: None,
        safe_sql: None,
    }
}

/// Backfill literal for a mandatory column with observed nulls.
fn default_literal_for(attribute: &Attribute) -> String {
    if let Some(default) = attribute.observed_default.as_deref() {
        if !default.trim().is_empty() {
            return default.trim().to_string();
        }
    }
    match attribute.data_type.to_ascii_lowercase().as_str() {
        "identifier" | "integer" | "long integer" | "longinteger" | "decimal" | "currency" => {
            "0".to_string()
        }
        "boolean" => "0".to_string(),
        "date" | "datetime" | "date time" => "'1900-01-01'".to_string(),
        "time" => "'00:00:00'".to_string(),
        "guid" => "'00000000-0000-0000-0000-000000000000'".to_string(),
        _ => "N''".to_string(),
    }
}
