//! Tightening policy tests — decision rules, modes, budget, partitioning.

use chrono::DateTime;
use osmforge_analysis::model::{Attribute, Entity, Module, OsmModel};
use osmforge_analysis::naming::EffectiveNameResolver;
use osmforge_analysis::profile::{
    ColumnProfile, ForeignKeyReality, ProbeStatus, ProfileSnapshot, UniqueCandidate,
};
use osmforge_analysis::tightening::{
    OpportunityDisposition, TighteningPolicyEngine,
};
use osmforge_core::config::toggles::TOGGLE_POLICY_MODE;
use osmforge_core::config::{
    NamingOverrideOptions, PolicyMode, TighteningOptions, TighteningToggleSnapshot, Toggle,
    ToggleSource,
};
use osmforge_core::types::{
    AttributeName, ColumnCoordinate, ColumnName, EntityName, ModuleName,
    RelationshipConstraintKey, SchemaName, TableName,
};

fn attribute(logical: &str, column: &str, data_type: &str, mandatory: bool) -> Attribute {
    Attribute {
        logical_name: AttributeName::new(logical).unwrap(),
        column_name: ColumnName::new(column).unwrap(),
        data_type: data_type.to_string(),
        length: Some(250),
        is_mandatory: mandatory,
        is_identifier: false,
        is_auto_number: false,
        is_active: true,
        reference: None,
        observed_default: None,
        observed_type: None,
    }
}

fn customer_entity() -> Entity {
    Entity {
        module: ModuleName::new("Sales").unwrap(),
        logical_name: EntityName::new("Customer").unwrap(),
        table_name: TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
        schema: SchemaName::dbo(),
        catalog: None,
        is_static: false,
        is_external: false,
        is_active: true,
        attributes: vec![attribute("Email", "EMAIL", "Text", false)],
        indexes: vec![],
        relationships: vec![],
        triggers: vec![],
    }
}

fn model_of(entities: Vec<Entity>) -> OsmModel {
    OsmModel {
        exported_at_utc: DateTime::UNIX_EPOCH,
        modules: vec![Module {
            name: ModuleName::new("Sales").unwrap(),
            is_system: false,
            is_active: true,
            entities,
        }],
    }
}

fn succeeded() -> ProbeStatus {
    ProbeStatus::Succeeded {
        at_utc: DateTime::UNIX_EPOCH,
        sampled: false,
    }
}

fn column_profile(column: &str, nullable: bool, null_count: u64) -> ColumnProfile {
    ColumnProfile {
        schema: SchemaName::dbo(),
        table: TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
        column: ColumnName::new(column).unwrap(),
        is_nullable_physical: nullable,
        is_computed: false,
        is_primary_key: false,
        is_unique_key: false,
        default_definition: None,
        row_count: 1000,
        null_count,
        probe_status: succeeded(),
    }
}

fn engine(mode: PolicyMode) -> TighteningPolicyEngine {
    let options = TighteningOptions {
        mode,
        ..Default::default()
    };
    let toggles = TighteningToggleSnapshot {
        entries: vec![Toggle::new(
            TOGGLE_POLICY_MODE,
            mode.as_str(),
            ToggleSource::Configuration,
        )],
    };
    TighteningPolicyEngine::new(options, toggles)
}

fn decide(
    engine: &TighteningPolicyEngine,
    model: &OsmModel,
    profile: &ProfileSnapshot,
) -> (
    osmforge_analysis::tightening::PolicyDecisionSet,
    osmforge_analysis::tightening::OpportunitiesReport,
) {
    let resolver = EffectiveNameResolver::build(model, &NamingOverrideOptions::default());
    engine.decide(model, profile, &resolver, DateTime::UNIX_EPOCH)
}

#[test]
fn zero_nulls_tightens_in_evidence_gated_mode() {
    let model = model_of(vec![customer_entity()]);
    let profile = ProfileSnapshot {
        columns: vec![column_profile("EMAIL", true, 0)],
        ..Default::default()
    };

    let (set, report) = decide(&engine(PolicyMode::EvidenceGated), &model, &profile);

    let coordinate = ColumnCoordinate::new(
        SchemaName::dbo(),
        TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
        ColumnName::new("EMAIL").unwrap(),
    );
    assert!(set.wants_not_null(&coordinate));
    let decision = &set.nullability[&coordinate];
    assert!(decision.rationale.contains("policy.mode=EvidenceGated"));

    let safe = report.safe_script();
    assert!(safe.contains("ALTER TABLE [dbo].[OSUSR_ABC_CUSTOMER] ALTER COLUMN [EMAIL]"));
    assert!(safe.contains("NOT NULL"));
}

#[test]
fn cautious_mode_reports_but_never_tightens() {
    let model = model_of(vec![customer_entity()]);
    let profile = ProfileSnapshot {
        columns: vec![column_profile("EMAIL", true, 0)],
        ..Default::default()
    };

    let (set, report) = decide(&engine(PolicyMode::Cautious), &model, &profile);

    assert!(set.nullability.is_empty());
    assert_eq!(report.safe_script(), "");
    assert_eq!(report.opportunities.len(), 1);
    assert_eq!(
        report.opportunities[0].disposition,
        OpportunityDisposition::Informational
    );
}

#[test]
fn mandatory_column_with_nulls_needs_remediation() {
    let mut entity = customer_entity();
    entity.attributes[0].is_mandatory = true;
    let model = model_of(vec![entity]);
    let profile = ProfileSnapshot {
        columns: vec![column_profile("EMAIL", true, 42)],
        ..Default::default()
    };

    let (set, report) = decide(&engine(PolicyMode::EvidenceGated), &model, &profile);

    let coordinate = ColumnCoordinate::new(
        SchemaName::dbo(),
        TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
        ColumnName::new("EMAIL").unwrap(),
    );
    assert!(!set.wants_not_null(&coordinate));
    assert_eq!(report.pending_remediation_count(), 1);

    let remediation = report.remediation_script();
    assert!(remediation.contains("UPDATE [dbo].[OSUSR_ABC_CUSTOMER]"));
    assert!(remediation.contains("WHERE [EMAIL] IS NULL"));
    // The remediation bundle never leaks into the safe bundle.
    assert_eq!(report.safe_script(), "");
}

#[test]
fn null_budget_suppresses_excess_remediation_proposals() {
    let mut entity = customer_entity();
    entity.attributes = (0..5)
        .map(|i| {
            let mut a = attribute(&format!("Col{i}"), &format!("COL{i}"), "Text", true);
            a.is_mandatory = true;
            a
        })
        .collect();
    let model = model_of(vec![entity]);
    let profile = ProfileSnapshot {
        columns: (0..5)
            .map(|i| column_profile(&format!("COL{i}"), true, 10))
            .collect(),
        ..Default::default()
    };

    let options = TighteningOptions {
        mode: PolicyMode::EvidenceGated,
        null_budget: 2,
        enforce_composite_unique: None,
    };
    let engine = TighteningPolicyEngine::new(options, TighteningToggleSnapshot::default());
    let (set, report) = decide(&engine, &model, &profile);

    assert_eq!(report.pending_remediation_count(), 2);
    assert!(set
        .diagnostics
        .iter()
        .any(|d| d.code == "policy.budget.exceeded"));
}

#[test]
fn unique_candidate_without_duplicates_is_enforced() {
    let model = model_of(vec![customer_entity()]);
    let profile = ProfileSnapshot {
        unique_candidates: vec![UniqueCandidate {
            schema: SchemaName::dbo(),
            table: TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
            column: ColumnName::new("EMAIL").unwrap(),
            has_duplicate: false,
            probe_status: succeeded(),
        }],
        ..Default::default()
    };

    let (set, report) = decide(&engine(PolicyMode::EvidenceGated), &model, &profile);

    assert_eq!(set.uniqueness.len(), 1);
    assert!(set.uniqueness.values().next().unwrap().enforce);
    assert!(report
        .safe_script()
        .contains("CREATE UNIQUE INDEX [UX_OSUSR_ABC_CUSTOMER_EMAIL]"));
}

#[test]
fn fk_without_orphans_is_enforced_with_orphans_needs_remediation() {
    use osmforge_analysis::model::{ActualConstraint, ConstraintColumn, Relationship};

    let parent = Entity {
        logical_name: EntityName::new("Country").unwrap(),
        table_name: TableName::new("OSUSR_ABC_COUNTRY").unwrap(),
        ..customer_entity()
    };
    let mut child = customer_entity();
    child.relationships.push(Relationship {
        via_attribute: AttributeName::new("CountryId").unwrap(),
        to_entity: EntityName::new("Country").unwrap(),
        to_table: TableName::new("OSUSR_ABC_COUNTRY").unwrap(),
        delete_rule_code: None,
        has_database_constraint: true,
        actual_constraints: vec![ActualConstraint {
            name: Some("FK_CUSTOMER_COUNTRY".to_string()),
            referenced_schema: Some(SchemaName::dbo()),
            referenced_table: Some(TableName::new("OSUSR_ABC_COUNTRY").unwrap()),
            on_delete: None,
            on_update: None,
            columns: vec![ConstraintColumn {
                owner_column: Some(ColumnName::new("COUNTRYID").unwrap()),
                owner_attribute: None,
                referenced_column: Some(ColumnName::new("ID").unwrap()),
                referenced_attribute: None,
                ordinal: 1,
            }],
        }],
    });
    let model = model_of(vec![parent, child]);
    let key = RelationshipConstraintKey::new(
        SchemaName::dbo(),
        TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
        ColumnName::new("FK_CUSTOMER_COUNTRY").unwrap(),
    );

    // Clean reality: enforce.
    let profile = ProfileSnapshot {
        foreign_keys: vec![ForeignKeyReality {
            reference: key.clone(),
            has_orphan: false,
            is_no_check: false,
            probe_status: succeeded(),
        }],
        ..Default::default()
    };
    let (set, report) = decide(&engine(PolicyMode::EvidenceGated), &model, &profile);
    assert!(set.foreign_keys[&key].create_constraint);
    assert!(report
        .safe_script()
        .contains("ADD CONSTRAINT [FK_CUSTOMER_COUNTRY] FOREIGN KEY ([COUNTRYID])"));

    // Orphans: remediation, not safe.
    let profile = ProfileSnapshot {
        foreign_keys: vec![ForeignKeyReality {
            reference: key.clone(),
            has_orphan: true,
            is_no_check: false,
            probe_status: succeeded(),
        }],
        ..Default::default()
    };
    let (set, report) = decide(&engine(PolicyMode::EvidenceGated), &model, &profile);
    assert!(!set.foreign_keys[&key].create_constraint);
    assert_eq!(report.pending_remediation_count(), 1);
    assert!(report.remediation_script().contains("DELETE c FROM"));

    // NOCHECK: informational only.
    let profile = ProfileSnapshot {
        foreign_keys: vec![ForeignKeyReality {
            reference: key.clone(),
            has_orphan: false,
            is_no_check: true,
            probe_status: succeeded(),
        }],
        ..Default::default()
    };
    let (_, report) = decide(&engine(PolicyMode::EvidenceGated), &model, &profile);
    assert_eq!(report.safe_script(), "");
    assert_eq!(report.pending_remediation_count(), 0);
    assert_eq!(
        report.opportunities[0].disposition,
        OpportunityDisposition::Informational
    );

    // Failed probe: no decision, but the gap is diagnosed.
    let profile = ProfileSnapshot {
        foreign_keys: vec![ForeignKeyReality {
            reference: key.clone(),
            has_orphan: false,
            is_no_check: false,
            probe_status: ProbeStatus::Failed {
                reason: "timeout".to_string(),
            },
        }],
        ..Default::default()
    };
    let (set, report) = decide(&engine(PolicyMode::EvidenceGated), &model, &profile);
    assert!(set.foreign_keys.is_empty());
    assert_eq!(report.safe_script(), "");
    assert!(set
        .diagnostics
        .iter()
        .any(|d| d.code == "policy.probe.unavailable" && d.message.contains("timeout")));
}

#[test]
fn safe_and_remediation_partition_is_disjoint() {
    let mut tight = customer_entity();
    tight.attributes.push({
        let mut a = attribute("Name", "NAME", "Text", true);
        a.is_mandatory = true;
        a
    });
    let model = model_of(vec![tight]);
    let profile = ProfileSnapshot {
        columns: vec![
            column_profile("EMAIL", true, 0),
            column_profile("NAME", true, 7),
        ],
        ..Default::default()
    };

    let (_, report) = decide(&engine(PolicyMode::EvidenceGated), &model, &profile);

    let safe = report.safe_script();
    let remediation = report.remediation_script();
    assert!(safe.contains("[EMAIL]"));
    assert!(!safe.contains("[NAME]"));
    assert!(remediation.contains("[NAME]"));
    assert!(!remediation.contains("[EMAIL]"));
}
