//! Translate the filtered model plus decisions into the physical model.

use osmforge_analysis::model::type_map::physical_type_for;
use osmforge_analysis::model::{Entity, OsmModel};
use osmforge_analysis::naming::{assign_module_folders, EffectiveNameResolver, ModuleFolder};
use osmforge_analysis::tightening::{ForeignKeyAction, PolicyDecisionSet};
use osmforge_core::types::{ColumnCoordinate, ColumnName};

use super::types::{SmoColumn, SmoForeignKey, SmoIndex, SmoModel, SmoPrimaryKey, SmoTable};

/// Build the physical model. Deterministic over (model, decisions, resolver).
/// Returns the model plus the module folder assignments (for remap logging).
pub fn build_smo_model(
    model: &OsmModel,
    decisions: &PolicyDecisionSet,
    resolver: &EffectiveNameResolver,
    sanitize_module_names: bool,
) -> (SmoModel, Vec<ModuleFolder>) {
    let folders: Vec<ModuleFolder> = if sanitize_module_names {
        assign_module_folders(model.modules.iter().map(|m| m.name.as_str()))
    } else {
        model
            .modules
            .iter()
            .map(|m| ModuleFolder {
                original_name: m.name.as_str().to_string(),
                sanitized_name: m.name.as_str().to_string(),
                disambiguated_name: m.name.as_str().to_string(),
            })
            .collect()
    };

    let mut smo = SmoModel::default();
    for (module, folder) in model.modules.iter().zip(folders.iter()) {
        for entity in &module.entities {
            smo.tables
                .push(build_table(entity, folder, decisions, resolver));
        }
    }
    (smo, folders)
}

fn build_table(
    entity: &Entity,
    folder: &ModuleFolder,
    decisions: &PolicyDecisionSet,
    resolver: &EffectiveNameResolver,
) -> SmoTable {
    let effective_name = resolver.for_entity(entity);

    let columns: Vec<SmoColumn> = entity
        .attributes
        .iter()
        .map(|attribute| {
            let coordinate = ColumnCoordinate::new(
                entity.schema.clone(),
                entity.table_name.clone(),
                attribute.column_name.clone(),
            );
            let not_null = attribute.is_mandatory
                || attribute.is_identifier
                || decisions.wants_not_null(&coordinate);
            SmoColumn {
                name: attribute.column_name.clone(),
                sql_type: physical_type_for(attribute),
                nullable: !not_null,
                identity: attribute.is_auto_number,
                default_definition: attribute.observed_default.clone(),
            }
        })
        .collect();

    let primary_key = entity.identifier().map(|identifier| SmoPrimaryKey {
        name: format!("PK_{}", effective_name.as_str()),
        columns: vec![identifier.column_name.clone()],
    });

    // Modeled indexes first, then decision-enforced ones not already present.
    let mut indexes: Vec<SmoIndex> = entity
        .indexes
        .iter()
        .map(|index| SmoIndex {
            name: index.name.as_str().to_string(),
            columns: index.columns.clone(),
            is_unique: index.is_unique,
        })
        .collect();
    for decision in decisions.uniqueness.values() {
        if !decision.enforce
            || decision.index.schema != entity.schema
            || decision.index.table != entity.table_name
        {
            continue;
        }
        let name = decision.index.index.as_str();
        match indexes.iter_mut().find(|i| i.name.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.is_unique = true,
            None => {
                // Synthesized from a unique candidate: single column named
                // UX_<table>_<column>.
                let column = name
                    .rsplit('_')
                    .next()
                    .and_then(|c| ColumnName::new(c).ok());
                if let Some(column) = column {
                    indexes.push(SmoIndex {
                        name: name.to_string(),
                        columns: vec![column],
                        is_unique: true,
                    });
                }
            }
        }
    }

    let foreign_keys = build_foreign_keys(entity, decisions, resolver);

    SmoTable {
        module: entity.module.clone(),
        module_folder: folder.disambiguated_name.clone(),
        logical_name: entity.logical_name.clone(),
        schema: entity.schema.clone(),
        physical_name: entity.table_name.clone(),
        effective_name,
        is_static: entity.is_static,
        is_external: entity.is_external,
        columns,
        primary_key,
        indexes,
        foreign_keys,
    }
}

fn build_foreign_keys(
    entity: &Entity,
    decisions: &PolicyDecisionSet,
    resolver: &EffectiveNameResolver,
) -> Vec<SmoForeignKey> {
    let mut foreign_keys = Vec::new();
    for relationship in &entity.relationships {
        if !relationship.has_database_constraint {
            continue;
        }
        for constraint in &relationship.actual_constraints {
            if !constraint.is_hydrated() {
                continue;
            }
            let key = constraint.key(&entity.schema, &entity.table_name);
            // A decision overrides the modeled default; without evidence the
            // hydrated constraint is emitted as modeled.
            let (include, action) = match key.as_ref().and_then(|k| decisions.foreign_keys.get(k)) {
                Some(decision) => (decision.create_constraint, decision.action),
                None => (
                    true,
                    ForeignKeyAction::from_delete_rule(relationship.delete_rule_code.as_deref()),
                ),
            };
            if !include {
                continue;
            }

            let name = constraint
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| {
                    format!(
                        "FK_{}_{}",
                        entity.table_name.as_str(),
                        relationship.via_attribute.as_str()
                    )
                });
            let referenced_schema = constraint
                .referenced_schema
                .clone()
                .unwrap_or_else(|| entity.schema.clone());
            let referenced_physical = constraint
                .referenced_table
                .clone()
                .unwrap_or_else(|| relationship.to_table.clone());

            foreign_keys.push(SmoForeignKey {
                name,
                columns: constraint
                    .columns
                    .iter()
                    .filter_map(|c| c.owner_column.clone())
                    .collect(),
                referenced_schema,
                referenced_table: resolver.resolve(&referenced_physical),
                referenced_columns: constraint
                    .columns
                    .iter()
                    .filter_map(|c| c.referenced_column.clone())
                    .collect(),
                on_delete: action,
            });
        }
    }
    foreign_keys
}
