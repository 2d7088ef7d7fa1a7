//! Foreign-key constraint hydration.
//!
//! Constraints arrive from extraction with empty column pairs; a metadata
//! provider fills them in. Unnamed constraints cannot be looked up and stay
//! non-hydrated; downstream consumers treat them as skipped.

use osmforge_core::types::{
    ColumnName, FxHashMap, RelationshipConstraintKey, SchemaName, TableName,
};

use super::types::{ConstraintColumn, OsmModel};

/// One constraint column row returned by the metadata source.
#[derive(Debug, Clone)]
pub struct ForeignKeyColumnMetadata {
    pub key: RelationshipConstraintKey,
    pub ordinal: u32,
    pub owner_column: ColumnName,
    pub referenced_column: ColumnName,
    pub referenced_schema: SchemaName,
    pub referenced_table: TableName,
}

/// Contract for the live metadata source that resolves constraint columns.
pub trait RelationshipConstraintMetadataProvider {
    fn load(
        &self,
        keys: &[RelationshipConstraintKey],
    ) -> Result<Vec<ForeignKeyColumnMetadata>, String>;
}

/// Hydrate every FK relationship whose constraints have empty columns.
/// Returns the warning channel; lookup misses never fail the model.
pub fn hydrate_model(
    model: &mut OsmModel,
    provider: &dyn RelationshipConstraintMetadataProvider,
) -> Result<Vec<String>, String> {
    let mut warnings = Vec::new();

    // Collect the keys that actually need hydration.
    let mut keys: Vec<RelationshipConstraintKey> = Vec::new();
    for module in &model.modules {
        for entity in &module.entities {
            for relationship in &entity.relationships {
                if !relationship.has_database_constraint {
                    continue;
                }
                for constraint in &relationship.actual_constraints {
                    if constraint.is_hydrated() {
                        continue;
                    }
                    match constraint.key(&entity.schema, &entity.table_name) {
                        Some(key) => {
                            if !keys.contains(&key) {
                                keys.push(key);
                            }
                        }
                        None => warnings.push(format!(
                            "model.hydration.constraint.unnamed: unnamed constraint on {}.{} via '{}' cannot be hydrated",
                            entity.schema, entity.table_name, relationship.via_attribute
                        )),
                    }
                }
            }
        }
    }

    if keys.is_empty() {
        return Ok(warnings);
    }

    let rows = provider.load(&keys)?;

    let mut by_key: FxHashMap<RelationshipConstraintKey, Vec<ForeignKeyColumnMetadata>> =
        FxHashMap::default();
    for row in rows {
        by_key.entry(row.key.clone()).or_default().push(row);
    }
    for rows in by_key.values_mut() {
        rows.sort_by_key(|r| r.ordinal);
    }

    for module in &mut model.modules {
        for entity in &mut module.entities {
            let schema = entity.schema.clone();
            let table = entity.table_name.clone();
            for relationship in &mut entity.relationships {
                if !relationship.has_database_constraint {
                    continue;
                }
                for constraint in &mut relationship.actual_constraints {
                    if constraint.is_hydrated() {
                        continue;
                    }
                    let Some(key) = constraint.key(&schema, &table) else {
                        continue;
                    };
                    match by_key.get(&key) {
                        Some(rows) => {
                            constraint.columns = rows
                                .iter()
                                .map(|r| ConstraintColumn {
                                    owner_column: Some(r.owner_column.clone()),
                                    owner_attribute: None,
                                    referenced_column: Some(r.referenced_column.clone()),
                                    referenced_attribute: None,
                                    ordinal: r.ordinal,
                                })
                                .collect();
                            if constraint.referenced_schema.is_none() {
                                constraint.referenced_schema =
                                    rows.first().map(|r| r.referenced_schema.clone());
                            }
                            if constraint.referenced_table.is_none() {
                                constraint.referenced_table =
                                    rows.first().map(|r| r.referenced_table.clone());
                            }
                        }
                        None => warnings.push(format!(
                            "model.hydration.constraint.unresolved: no metadata rows for constraint '{}'; relationship stays non-hydrated",
                            key.constraint_name
                        )),
                    }
                }
            }
        }
    }

    Ok(warnings)
}
