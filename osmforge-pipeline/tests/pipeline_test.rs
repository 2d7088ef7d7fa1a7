//! End-to-end pipeline tests over fixture files.

use std::path::Path;

use osmforge_core::cancel::Context;
use osmforge_core::config::{EvidenceCacheOptions, PipelineConfig};
use osmforge_emit::providers::{
    SeedValue, StaticEntityDataProvider, StaticEntityDefinition, StaticEntityTableData,
};
use osmforge_pipeline::{run_build_ssdt, BuildSsdtRequest, Collaborators};
use tempfile::TempDir;

const MODEL_JSON: &str = r#"{
    "exportedAtUtc": "2025-06-01T12:00:00Z",
    "modules": [
        {
            "name": "Reference",
            "entities": [
                {
                    "name": "Parent",
                    "physicalName": "OSUSR_PARENT",
                    "isStatic": true,
                    "attributes": [
                        {"name": "Id", "physicalName": "ID", "dataType": "Identifier", "isIdentifier": true, "isMandatory": true},
                        {"name": "Label", "physicalName": "LABEL", "dataType": "Text", "length": 50}
                    ],
                    "relationships": [],
                    "indexes": [],
                    "triggers": []
                },
                {
                    "name": "Child",
                    "physicalName": "OSUSR_CHILD",
                    "isStatic": true,
                    "attributes": [
                        {"name": "Id", "physicalName": "ID", "dataType": "Identifier", "isIdentifier": true, "isMandatory": true},
                        {"name": "ParentId", "physicalName": "PARENTID", "dataType": "Integer"}
                    ],
                    "relationships": [
                        {
                            "viaAttribute": "ParentId",
                            "toEntity": "Parent",
                            "toTable": "OSUSR_PARENT",
                            "hasDatabaseConstraint": true,
                            "actualConstraints": [
                                {
                                    "name": "FK_CHILD_PARENT",
                                    "referencedSchema": "dbo",
                                    "referencedTable": "OSUSR_PARENT",
                                    "columns": [
                                        {"ownerColumn": "PARENTID", "referencedColumn": "ID", "ordinal": 1}
                                    ]
                                }
                            ]
                        }
                    ],
                    "indexes": [],
                    "triggers": []
                }
            ]
        },
        {
            "name": "Sales",
            "entities": [
                {
                    "name": "Customer",
                    "physicalName": "OSUSR_CUSTOMER",
                    "attributes": [
                        {"name": "Id", "physicalName": "ID", "dataType": "Identifier", "isIdentifier": true, "isMandatory": true},
                        {"name": "Email", "physicalName": "EMAIL", "dataType": "Text", "length": 250}
                    ],
                    "relationships": [],
                    "indexes": [],
                    "triggers": []
                }
            ]
        }
    ]
}"#;

const PROFILE_JSON: &str = r#"{
    "columns": [
        {
            "schema": "dbo", "table": "OSUSR_CUSTOMER", "column": "EMAIL",
            "isNullablePhysical": true, "isComputed": false,
            "isPrimaryKey": false, "isUniqueKey": false,
            "rowCount": 500, "nullCount": 0,
            "probeStatus": {"status": "succeeded", "atUtc": "2025-06-01T12:00:00Z", "sampled": false}
        }
    ],
    "uniqueCandidates": [
        {
            "schema": "dbo", "table": "OSUSR_CUSTOMER", "column": "EMAIL",
            "hasDuplicate": false,
            "probeStatus": {"status": "succeeded", "atUtc": "2025-06-01T12:00:00Z", "sampled": false}
        }
    ],
    "compositeUniqueCandidates": [],
    "foreignKeys": [
        {
            "reference": {"schema": "dbo", "table": "OSUSR_CHILD", "constraintName": "FK_CHILD_PARENT"},
            "hasOrphan": false, "isNoCheck": false,
            "probeStatus": {"status": "succeeded", "atUtc": "2025-06-01T12:00:00Z", "sampled": false}
        }
    ]
}"#;

/// Returns rows reversed to prove output never depends on provider order.
struct ReversingProvider;

impl StaticEntityDataProvider for ReversingProvider {
    fn get_data(
        &self,
        definitions: &[StaticEntityDefinition],
    ) -> Result<Vec<StaticEntityTableData>, String> {
        Ok(definitions
            .iter()
            .map(|d| {
                let mut rows = vec![
                    vec![SeedValue::Int(1), SeedValue::String("One".to_string())],
                    vec![SeedValue::Int(2), SeedValue::String("Two".to_string())],
                ];
                rows.reverse();
                Ok(StaticEntityTableData {
                    logical_name: d.logical_name.clone(),
                    rows,
                })
            })
            .collect::<Result<Vec<_>, String>>()?)
    }
}

fn write_fixtures(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let model = dir.join("model.json");
    let profile = dir.join("profile.json");
    std::fs::write(&model, MODEL_JSON).unwrap();
    std::fs::write(&profile, PROFILE_JSON).unwrap();
    (model, profile)
}

fn request_for(dir: &Path, output: &Path) -> BuildSsdtRequest {
    let (model, profile) = write_fixtures(dir);
    let mut request = BuildSsdtRequest::new(model, output);
    request.profile_path = Some(profile);
    request.config = PipelineConfig::default();
    request
}

fn collaborators(provider: &ReversingProvider) -> Collaborators<'_> {
    Collaborators {
        metadata_provider: None,
        profiler: None,
        static_data: provider,
        dynamic_data: None,
    }
}

#[test]
fn full_run_produces_all_artifacts_and_log_steps() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("output");
    let request = request_for(temp.path(), &output);
    let provider = ReversingProvider;

    let outcome = run_build_ssdt(&request, &collaborators(&provider), &Context::new()).unwrap();

    for artifact in [
        "manifest.json",
        "decision-log.json",
        "opportunities.json",
        "validations.json",
        "execution-log.json",
        "OutSystemsModel.sqlproj",
        "Opportunities/safe.sql",
        "Opportunities/needs-remediation.sql",
        "Modules/Reference.Parent.sql",
        "Modules/Reference.Child.sql",
        "Modules/Sales.Customer.sql",
        "Seeds/Reference/Reference.seed.sql",
    ] {
        assert!(output.join(artifact).exists(), "missing artifact {artifact}");
    }

    for step in [
        "request.received",
        "model.ingested",
        "model.filtered",
        "profiling.capture.start",
        "profiling.capture.completed",
        "policy.decisions.synthesized",
        "ssdt.emission.completed",
        "policy.log.persisted",
        "ssdt.sql.validation.completed",
        "staticData.seed.preflight",
        "staticData.seed.generated",
        "pipeline.execution",
    ] {
        assert!(outcome.log.contains_step(step), "missing log step {step}");
    }

    // The profiled evidence tightens EMAIL and enforces its uniqueness.
    let safe = std::fs::read_to_string(output.join("Opportunities/safe.sql")).unwrap();
    assert!(safe.contains("ALTER COLUMN [EMAIL]"));
    assert!(safe.contains("CREATE UNIQUE INDEX"));

    // Seed ordering: parent strictly before child.
    let order: Vec<&str> = outcome.seed_order.iter().map(|t| t.as_str()).collect();
    let parent_index = order.iter().position(|t| *t == "OSUSR_PARENT").unwrap();
    let child_index = order.iter().position(|t| *t == "OSUSR_CHILD").unwrap();
    assert!(child_index > parent_index);

    let ordering = outcome.ordering_validation.unwrap();
    assert!(ordering.is_valid);
    assert_eq!(ordering.total_foreign_keys, 1);
    assert!(!ordering.cycle_detected);

    assert_eq!(outcome.sql_validation.error_count, 0);
}

#[test]
fn two_runs_produce_byte_identical_core_artifacts() {
    let temp = TempDir::new().unwrap();
    let provider = ReversingProvider;

    let output_a = temp.path().join("a");
    let request_a = request_for(temp.path(), &output_a);
    run_build_ssdt(&request_a, &collaborators(&provider), &Context::new()).unwrap();

    let output_b = temp.path().join("b");
    let request_b = request_for(temp.path(), &output_b);
    run_build_ssdt(&request_b, &collaborators(&provider), &Context::new()).unwrap();

    for artifact in [
        "manifest.json",
        "decision-log.json",
        "Modules/Sales.Customer.sql",
        "Seeds/Reference/Reference.seed.sql",
        "OutSystemsModel.sqlproj",
    ] {
        let a = std::fs::read(output_a.join(artifact)).unwrap();
        let b = std::fs::read(output_b.join(artifact)).unwrap();
        assert_eq!(a, b, "artifact {artifact} differs between runs");
    }
}

#[test]
fn evidence_cache_records_persisted_then_reused() {
    let temp = TempDir::new().unwrap();
    let provider = ReversingProvider;
    let cache_root = temp.path().join("cache");

    let output_a = temp.path().join("a");
    let mut request = request_for(temp.path(), &output_a);
    request.use_evidence_cache = true;
    request.config.cache = EvidenceCacheOptions {
        root: cache_root.clone(),
        ..Default::default()
    };
    let first = run_build_ssdt(&request, &collaborators(&provider), &Context::new()).unwrap();
    assert!(first.log.contains_step("evidence.cache.persisted"));

    request.output_dir = temp.path().join("b");
    let second = run_build_ssdt(&request, &collaborators(&provider), &Context::new()).unwrap();
    assert!(second.log.contains_step("evidence.cache.reused"));
    let entry = &second.log.entries_for("evidence.cache.reused")[0];
    assert_eq!(entry.metadata["reason"], "cache.reused");
}

#[test]
fn missing_model_fails_on_ingestion_step() {
    let temp = TempDir::new().unwrap();
    let request = BuildSsdtRequest::new(temp.path().join("absent.json"), temp.path().join("out"));
    let provider = ReversingProvider;
    let failure =
        run_build_ssdt(&request, &collaborators(&provider), &Context::new()).unwrap_err();
    assert_eq!(failure.step, "model.ingested");
    assert_eq!(failure.errors[0].code, "model.load.failed");
}

#[test]
fn cancellation_surfaces_pipeline_canceled() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out");
    let request = request_for(temp.path(), &output);
    let provider = ReversingProvider;

    let ctx = Context::new();
    ctx.cancel.cancel();
    let failure = run_build_ssdt(&request, &collaborators(&provider), &ctx).unwrap_err();
    assert_eq!(failure.errors[0].code, "pipeline.canceled");
}

#[test]
fn telemetry_packaging_zips_key_artifacts() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out");
    let mut request = request_for(temp.path(), &output);
    request.package_telemetry = true;
    let provider = ReversingProvider;

    run_build_ssdt(&request, &collaborators(&provider), &Context::new()).unwrap();
    let archive = output.join("telemetry.zip");
    assert!(archive.exists());
    assert!(std::fs::metadata(&archive).unwrap().len() > 0);
}
