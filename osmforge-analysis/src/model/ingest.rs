//! Model ingestion — parse, contract-check, convert, filter.

use std::io::Read;
use std::path::Path;

use osmforge_core::config::ModuleSelection;
use osmforge_core::errors::{codes, ErrorBag, ErrorCode, ModelError, StepResult, ValidationError};
use osmforge_core::types::{
    AttributeName, ColumnName, EntityName, FxHashSet, ModuleName, SchemaName, TableName,
};

use super::raw::{RawEntity, RawModel, RawModule};
use super::types::{
    ActualConstraint, Attribute, AttributeReference, ConstraintColumn, Entity, IndexDefinition,
    Module, OsmModel, Relationship, TriggerDefinition,
};

/// Ingestion options.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Sort modules by name (case-insensitive) after conversion.
    pub sort_modules: bool,
}

/// Ingestion result: the model plus its warning channel.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: OsmModel,
    pub warnings: Vec<String>,
}

/// Load a logical model from a JSON file.
pub fn load_from_path(path: &Path, options: &LoadOptions) -> StepResult<LoadedModel> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        vec![ModelError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .to_validation()]
    })?;
    load_from_str(&text, path, options)
}

/// Load a logical model from an open reader.
pub fn load_from_reader(reader: &mut dyn Read, options: &LoadOptions) -> StepResult<LoadedModel> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(|e| {
        vec![ModelError::LoadFailed {
            path: "<stream>".into(),
            reason: e.to_string(),
        }
        .to_validation()]
    })?;
    load_from_str(&text, Path::new("<stream>"), options)
}

fn load_from_str(text: &str, origin: &Path, options: &LoadOptions) -> StepResult<LoadedModel> {
    let raw: RawModel = serde_json::from_str(text).map_err(|e| {
        vec![ModelError::LoadFailed {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        }
        .to_validation()]
    })?;
    convert(raw, options)
}

fn convert(raw: RawModel, options: &LoadOptions) -> StepResult<LoadedModel> {
    let mut errors = ErrorBag::new();
    let mut warnings = Vec::new();

    warn_unknown_fields(&mut warnings, "model", &raw.extra);

    let exported_at_utc = match raw.exported_at_utc {
        Some(ts) => ts,
        None => {
            warnings.push("model.schema.warnings: missing exportedAtUtc".to_string());
            chrono::DateTime::UNIX_EPOCH
        }
    };

    let raw_modules = match raw.modules {
        Some(modules) => modules,
        None => {
            errors.push(ModelError::NullModuleArray.to_validation());
            return errors.into_result(LoadedModel {
                model: OsmModel {
                    exported_at_utc,
                    modules: Vec::new(),
                },
                warnings,
            });
        }
    };

    if raw_modules.is_empty() {
        warnings.push("model.schema.warnings: no modules".to_string());
    }

    let mut modules = Vec::with_capacity(raw_modules.len());
    for raw_module in raw_modules {
        if let Some(module) = convert_module(raw_module, &mut errors, &mut warnings) {
            modules.push(module);
        }
    }

    let mut model = OsmModel {
        exported_at_utc,
        modules,
    };
    if options.sort_modules {
        model.sort_modules_by_name();
    }

    errors.into_result(LoadedModel { model, warnings })
}

fn convert_module(
    raw: RawModule,
    errors: &mut ErrorBag,
    warnings: &mut Vec<String>,
) -> Option<Module> {
    warn_unknown_fields(warnings, &format!("module '{}'", raw.name), &raw.extra);

    let name = match ModuleName::new(&raw.name) {
        Ok(name) => name,
        Err(e) => {
            errors.push(
                ValidationError::new(codes::MODEL_LOAD_FAILED, e.to_string())
                    .with_context(format!("module '{}'", raw.name)),
            );
            return None;
        }
    };

    let raw_entities = match raw.entities {
        Some(entities) => entities,
        None => {
            errors.push(
                ValidationError::new(
                    codes::EXTRACTION_CONTRACT_ENTITY_ARRAY,
                    format!("module '{name}' has a null 'entities' array"),
                )
                .with_context(format!("module '{name}'")),
            );
            return None;
        }
    };

    if raw_entities.is_empty() {
        warnings.push(format!(
            "model.module.empty: module '{name}' has no entities and was skipped"
        ));
        return None;
    }

    let mut entities = Vec::with_capacity(raw_entities.len());
    for raw_entity in raw_entities {
        if let Some(entity) = convert_entity(raw_entity, &name, errors, warnings) {
            entities.push(entity);
        }
    }

    Some(Module {
        name,
        is_system: raw.is_system,
        is_active: raw.is_active,
        entities,
    })
}

fn convert_entity(
    raw: RawEntity,
    module: &ModuleName,
    errors: &mut ErrorBag,
    warnings: &mut Vec<String>,
) -> Option<Entity> {
    warn_unknown_fields(warnings, &format!("entity '{}'", raw.name), &raw.extra);

    let mut contract_ok = true;
    for (array, present) in [
        ("attributes", raw.attributes.is_some()),
        ("relationships", raw.relationships.is_some()),
        ("indexes", raw.indexes.is_some()),
        ("triggers", raw.triggers.is_some()),
    ] {
        if !present {
            errors.push(
                ModelError::NullEntityArray {
                    entity: raw.name.clone(),
                    array,
                }
                .to_validation()
                .with_context(format!("module '{module}'")),
            );
            contract_ok = false;
        }
    }
    if !contract_ok {
        return None;
    }

    let logical_name = name_or_error::<EntityName>(
        EntityName::new(&raw.name),
        &raw.name,
        "entity",
        errors,
    )?;
    let table_name = name_or_error::<TableName>(
        TableName::new(&raw.physical_name),
        &raw.name,
        "entity physical name",
        errors,
    )?;
    let schema = match raw.db_schema.as_deref() {
        Some(s) if !s.trim().is_empty() => match SchemaName::new(s) {
            Ok(schema) => schema,
            Err(_) => SchemaName::dbo(),
        },
        _ => SchemaName::dbo(),
    };

    let mut attributes = Vec::new();
    let mut seen_columns: FxHashSet<String> = FxHashSet::default();
    for raw_attr in raw.attributes.into_iter().flatten() {
        warn_unknown_fields(
            warnings,
            &format!("attribute '{}' of entity '{}'", raw_attr.name, raw.name),
            &raw_attr.extra,
        );
        let Ok(attr_name) = AttributeName::new(&raw_attr.name) else {
            errors.push(
                ValidationError::new(
                    codes::MODEL_LOAD_FAILED,
                    "attribute name must be a non-empty string",
                )
                .with_context(format!("entity '{}'", raw.name)),
            );
            continue;
        };
        let Ok(column_name) = ColumnName::new(&raw_attr.physical_name) else {
            errors.push(
                ValidationError::new(
                    codes::MODEL_LOAD_FAILED,
                    format!("attribute '{attr_name}' has an empty column name"),
                )
                .with_context(format!("entity '{}'", raw.name)),
            );
            continue;
        };

        // Duplicate physical columns warn; both attributes are retained.
        if !seen_columns.insert(column_name.folded().to_string()) {
            warnings.push(format!(
                "model.attribute.column.duplicate: entity '{}' maps column '{}' from more than one attribute",
                raw.name, column_name
            ));
        }

        let reference = raw_attr.reference.and_then(|r| {
            let to_entity = EntityName::new(&r.to_entity).ok()?;
            Some(AttributeReference {
                to_entity,
                to_table: r.to_table.as_deref().and_then(|t| TableName::new(t).ok()),
                delete_rule: r.delete_rule,
                has_database_constraint: r.has_database_constraint,
            })
        });

        let (observed_default, observed_type) = raw_attr
            .reality
            .map(|r| (r.observed_default, r.observed_type))
            .unwrap_or((None, None));

        attributes.push(Attribute {
            logical_name: attr_name,
            column_name,
            data_type: raw_attr.data_type,
            length: raw_attr.length,
            is_mandatory: raw_attr.is_mandatory,
            is_identifier: raw_attr.is_identifier,
            is_auto_number: raw_attr.is_auto_number,
            is_active: raw_attr.is_active,
            reference,
            observed_default,
            observed_type,
        });
    }

    let relationships = raw
        .relationships
        .into_iter()
        .flatten()
        .filter_map(|r| {
            let via_attribute = AttributeName::new(&r.via_attribute).ok()?;
            let to_entity = EntityName::new(&r.to_entity).ok()?;
            let to_table = TableName::new(&r.to_table).ok()?;
            Some(Relationship {
                via_attribute,
                to_entity,
                to_table,
                delete_rule_code: r.delete_rule_code,
                has_database_constraint: r.has_database_constraint,
                actual_constraints: r
                    .actual_constraints
                    .into_iter()
                    .map(|c| ActualConstraint {
                        name: c.name,
                        referenced_schema: c
                            .referenced_schema
                            .as_deref()
                            .and_then(|s| SchemaName::new(s).ok()),
                        referenced_table: c
                            .referenced_table
                            .as_deref()
                            .and_then(|t| TableName::new(t).ok()),
                        on_delete: c.on_delete,
                        on_update: c.on_update,
                        columns: c
                            .columns
                            .into_iter()
                            .map(|col| ConstraintColumn {
                                owner_column: col
                                    .owner_column
                                    .as_deref()
                                    .and_then(|v| ColumnName::new(v).ok()),
                                owner_attribute: col
                                    .owner_attribute
                                    .as_deref()
                                    .and_then(|v| AttributeName::new(v).ok()),
                                referenced_column: col
                                    .referenced_column
                                    .as_deref()
                                    .and_then(|v| ColumnName::new(v).ok()),
                                referenced_attribute: col
                                    .referenced_attribute
                                    .as_deref()
                                    .and_then(|v| AttributeName::new(v).ok()),
                                ordinal: col.ordinal,
                            })
                            .collect(),
                    })
                    .collect(),
            })
        })
        .collect();

    let indexes = raw
        .indexes
        .into_iter()
        .flatten()
        .filter_map(|i| {
            let name = ColumnName::new(&i.name).ok()?;
            let columns = i
                .columns
                .iter()
                .filter_map(|c| ColumnName::new(c).ok())
                .collect();
            Some(IndexDefinition {
                name,
                columns,
                is_unique: i.is_unique,
            })
        })
        .collect();

    let triggers = raw
        .triggers
        .into_iter()
        .flatten()
        .map(|t| TriggerDefinition {
            name: t.name,
            is_active: t.is_active,
            definition: t.definition,
        })
        .collect();

    Some(Entity {
        module: module.clone(),
        logical_name,
        table_name,
        schema,
        catalog: raw.catalog,
        is_static: raw.is_static,
        is_external: raw.is_external,
        is_active: raw.is_active,
        attributes,
        indexes,
        relationships,
        triggers,
    })
}

fn name_or_error<T>(
    result: Result<T, osmforge_core::types::NameError>,
    entity: &str,
    what: &str,
    errors: &mut ErrorBag,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(
                ValidationError::new(codes::MODEL_LOAD_FAILED, format!("{what}: {e}"))
                    .with_context(format!("entity '{entity}'")),
            );
            None
        }
    }
}

fn warn_unknown_fields(
    warnings: &mut Vec<String>,
    scope: &str,
    extra: &std::collections::BTreeMap<String, serde_json::Value>,
) {
    for key in extra.keys() {
        warnings.push(format!(
            "model.schema.warnings: unknown field '{key}' on {scope}"
        ));
    }
}

/// Apply a module selection to a loaded model.
///
/// Modules the selection rejects are dropped; inactive entities and
/// attributes are dropped unless the selection includes them. Filtering that
/// removes every attribute of a surviving entity is a contract failure.
pub fn filter_model(model: &OsmModel, selection: &ModuleSelection) -> StepResult<OsmModel> {
    let mut errors = ErrorBag::new();
    let mut modules = Vec::new();

    for module in &model.modules {
        if !selection.admits(&module.name, module.is_system, module.is_active) {
            continue;
        }
        let mut entities = Vec::new();
        for entity in &module.entities {
            if !entity.is_active && !selection.include_inactive {
                continue;
            }
            let attributes: Vec<Attribute> = entity
                .attributes
                .iter()
                .filter(|a| a.is_active || selection.include_inactive)
                .cloned()
                .collect();
            if attributes.is_empty() {
                errors.push(
                    ModelError::NoAttributesRemain {
                        entity: entity.logical_name.as_str().to_string(),
                    }
                    .to_validation()
                    .with_context(format!("module '{}'", module.name)),
                );
                continue;
            }
            entities.push(Entity {
                attributes,
                ..entity.clone()
            });
        }
        if !entities.is_empty() {
            modules.push(Module {
                name: module.name.clone(),
                is_system: module.is_system,
                is_active: module.is_active,
                entities,
            });
        }
    }

    errors.into_result(OsmModel {
        exported_at_utc: model.exported_at_utc,
        modules,
    })
}
