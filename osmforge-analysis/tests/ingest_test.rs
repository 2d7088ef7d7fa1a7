//! Model ingestion tests — contracts, warnings, ordering, filtering.

use osmforge_analysis::model::ingest::{filter_model, load_from_reader, LoadOptions};
use osmforge_core::config::ModuleSelection;
use osmforge_core::errors::codes;
use osmforge_core::types::ModuleName;

fn load(json: &str) -> Result<osmforge_analysis::model::LoadedModel, Vec<osmforge_core::ValidationError>>
{
    let mut reader = json.as_bytes();
    load_from_reader(&mut reader, &LoadOptions::default())
}

const MINIMAL_ENTITY: &str = r#"{
    "name": "Customer",
    "physicalName": "OSUSR_ABC_CUSTOMER",
    "attributes": [
        {"name": "Id", "physicalName": "ID", "dataType": "Identifier", "isIdentifier": true},
        {"name": "Email", "physicalName": "EMAIL", "dataType": "Text", "length": 250}
    ],
    "relationships": [],
    "indexes": [],
    "triggers": []
}"#;

#[test]
fn minimal_model_loads_with_insertion_order() {
    let json = format!(
        r#"{{
            "exportedAtUtc": "2025-06-01T12:00:00Z",
            "modules": [
                {{"name": "Zeta", "entities": [{MINIMAL_ENTITY}]}},
                {{"name": "Alpha", "entities": [{MINIMAL_ENTITY}]}}
            ]
        }}"#
    );
    let loaded = load(&json).unwrap();
    let names: Vec<&str> = loaded
        .model
        .modules
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["Zeta", "Alpha"]);
    assert_eq!(loaded.model.modules[0].entities.len(), 1);
    assert!(loaded.warnings.is_empty());
}

#[test]
fn sort_option_orders_modules_case_insensitively() {
    let json = format!(
        r#"{{
            "exportedAtUtc": "2025-06-01T12:00:00Z",
            "modules": [
                {{"name": "zeta", "entities": [{MINIMAL_ENTITY}]}},
                {{"name": "Alpha", "entities": [{MINIMAL_ENTITY}]}}
            ]
        }}"#
    );
    let mut reader = json.as_bytes();
    let loaded = load_from_reader(
        &mut reader,
        &LoadOptions { sort_modules: true },
    )
    .unwrap();
    let names: Vec<&str> = loaded
        .model
        .modules
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "zeta"]);
}

#[test]
fn empty_modules_array_warns_no_modules() {
    let json = r#"{"exportedAtUtc": "2025-06-01T12:00:00Z", "modules": []}"#;
    let loaded = load(json).unwrap();
    assert!(loaded.model.modules.is_empty());
    assert!(loaded.warnings.iter().any(|w| w.contains("no modules")));
}

#[test]
fn null_modules_array_fails_contract() {
    let json = r#"{"exportedAtUtc": "2025-06-01T12:00:00Z", "modules": null}"#;
    let errors = load(json).unwrap_err();
    assert_eq!(errors[0].code, codes::EXTRACTION_CONTRACT_MODULE_ARRAY);
}

#[test]
fn module_without_entities_is_dropped_with_warning() {
    let json = format!(
        r#"{{
            "exportedAtUtc": "2025-06-01T12:00:00Z",
            "modules": [
                {{"name": "Empty", "entities": []}},
                {{"name": "Sales", "entities": [{MINIMAL_ENTITY}]}}
            ]
        }}"#
    );
    let loaded = load(&json).unwrap();
    assert_eq!(loaded.model.modules.len(), 1);
    assert_eq!(loaded.model.modules[0].name.as_str(), "Sales");
    assert!(loaded
        .warnings
        .iter()
        .any(|w| w.contains("model.module.empty") && w.contains("Empty")));
}

#[test]
fn null_entity_arrays_accumulate_contract_errors() {
    let json = r#"{
        "exportedAtUtc": "2025-06-01T12:00:00Z",
        "modules": [{
            "name": "Sales",
            "entities": [
                {"name": "Broken", "physicalName": "OSUSR_X", "attributes": null, "relationships": null, "indexes": [], "triggers": []}
            ]
        }]
    }"#;
    let errors = load(json).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| e.code == codes::EXTRACTION_CONTRACT_ENTITY_ARRAY));
}

#[test]
fn duplicate_physical_columns_warn_and_retain_both_attributes() {
    let json = r#"{
        "exportedAtUtc": "2025-06-01T12:00:00Z",
        "modules": [{
            "name": "Sales",
            "entities": [{
                "name": "Customer",
                "physicalName": "OSUSR_ABC_CUSTOMER",
                "attributes": [
                    {"name": "Email", "physicalName": "EMAIL", "dataType": "Text"},
                    {"name": "EmailCopy", "physicalName": "email", "dataType": "Text"}
                ],
                "relationships": [], "indexes": [], "triggers": []
            }]
        }]
    }"#;
    let loaded = load(json).unwrap();
    let entity = &loaded.model.modules[0].entities[0];
    assert_eq!(entity.attributes.len(), 2);
    assert!(loaded
        .warnings
        .iter()
        .any(|w| w.contains("model.attribute.column.duplicate")));
}

#[test]
fn unknown_fields_are_accepted_and_warned() {
    let json = r#"{
        "exportedAtUtc": "2025-06-01T12:00:00Z",
        "futureField": true,
        "modules": [{
            "name": "Sales",
            "entities": [{
                "name": "Customer",
                "physicalName": "OSUSR_ABC_CUSTOMER",
                "surprise": 42,
                "attributes": [{"name": "Id", "physicalName": "ID", "dataType": "Identifier"}],
                "relationships": [], "indexes": [], "triggers": []
            }]
        }]
    }"#;
    let loaded = load(json).unwrap();
    assert!(loaded
        .warnings
        .iter()
        .any(|w| w.contains("unknown field 'futureField'")));
    assert!(loaded
        .warnings
        .iter()
        .any(|w| w.contains("unknown field 'surprise'")));
}

#[test]
fn malformed_json_fails_with_load_error() {
    let errors = load("{not json").unwrap_err();
    assert_eq!(errors[0].code, codes::MODEL_LOAD_FAILED);
}

#[test]
fn filtering_inactive_attributes_can_fail_entity_contract() {
    let json = r#"{
        "exportedAtUtc": "2025-06-01T12:00:00Z",
        "modules": [{
            "name": "Sales",
            "entities": [{
                "name": "Ghost",
                "physicalName": "OSUSR_GHOST",
                "attributes": [
                    {"name": "Old", "physicalName": "OLD", "dataType": "Text", "isActive": false}
                ],
                "relationships": [], "indexes": [], "triggers": []
            }]
        }]
    }"#;
    let loaded = load(json).unwrap();
    let selection = ModuleSelection::default();
    let errors = filter_model(&loaded.model, &selection).unwrap_err();
    assert_eq!(errors[0].code, codes::MODEL_ENTITY_ATTRIBUTES_EMPTY);
}

#[test]
fn module_selection_filters_by_name_case_insensitively() {
    let json = format!(
        r#"{{
            "exportedAtUtc": "2025-06-01T12:00:00Z",
            "modules": [
                {{"name": "Sales", "entities": [{MINIMAL_ENTITY}]}},
                {{"name": "Billing", "entities": [{MINIMAL_ENTITY}]}}
            ]
        }}"#
    );
    let loaded = load(&json).unwrap();
    let selection = ModuleSelection {
        modules: vec![ModuleName::new("SALES").unwrap()],
        ..Default::default()
    };
    let filtered = filter_model(&loaded.model, &selection).unwrap();
    assert_eq!(filtered.modules.len(), 1);
    assert_eq!(filtered.modules[0].name.as_str(), "Sales");
}
