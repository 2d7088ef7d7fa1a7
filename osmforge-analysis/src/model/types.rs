//! Hydrated logical model types.
//!
//! Every entity carries its owning module name. Attribute identity within an
//! entity is the logical name; attribute order is stable across re-emissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use osmforge_core::types::{
    AttributeName, ColumnName, EntityName, ModuleName, RelationshipConstraintKey, SchemaName,
    TableName,
};

/// The logical application model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsmModel {
    pub exported_at_utc: DateTime<Utc>,
    pub modules: Vec<Module>,
}

impl OsmModel {
    /// All entities across modules, in module/entity insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.modules.iter().flat_map(|m| m.entities.iter())
    }

    /// Sort modules by name, case-insensitively. Only on explicit request;
    /// ingestion otherwise preserves insertion order.
    pub fn sort_modules_by_name(&mut self) {
        self.modules.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// One logical module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub name: ModuleName,
    pub is_system: bool,
    pub is_active: bool,
    pub entities: Vec<Entity>,
}

/// One logical entity with its physical mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Owning module name.
    pub module: ModuleName,
    pub logical_name: EntityName,
    pub table_name: TableName,
    pub schema: SchemaName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    pub is_static: bool,
    pub is_external: bool,
    pub is_active: bool,
    pub attributes: Vec<Attribute>,
    pub indexes: Vec<IndexDefinition>,
    pub relationships: Vec<Relationship>,
    pub triggers: Vec<TriggerDefinition>,
}

impl Entity {
    /// The identifier attribute, when one is flagged.
    pub fn identifier(&self) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is_identifier)
    }
}

/// One logical attribute with physical column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub logical_name: AttributeName,
    pub column_name: ColumnName,
    /// Logical data type (e.g. "Text", "Integer", "DateTime").
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    pub is_mandatory: bool,
    pub is_identifier: bool,
    pub is_auto_number: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<AttributeReference>,
    /// Default observed on the physical column, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_default: Option<String>,
    /// Physical type observed on disk, when it differs from the mapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_type: Option<String>,
}

/// Reference metadata for an attribute pointing at another entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeReference {
    pub to_entity: EntityName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_table: Option<TableName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_rule: Option<String>,
    pub has_database_constraint: bool,
}

/// One index definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    pub name: ColumnName,
    pub columns: Vec<ColumnName>,
    pub is_unique: bool,
}

/// One relationship from the owning entity to a referenced table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub via_attribute: AttributeName,
    pub to_entity: EntityName,
    pub to_table: TableName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_rule_code: Option<String>,
    pub has_database_constraint: bool,
    pub actual_constraints: Vec<ActualConstraint>,
}

impl Relationship {
    /// A relationship is a foreign key iff it has a database constraint and
    /// at least one actual constraint with hydrated column pairs.
    pub fn is_foreign_key(&self) -> bool {
        self.has_database_constraint && self.actual_constraints.iter().any(|c| c.is_hydrated())
    }
}

/// A constraint observed (or to be hydrated) on the physical database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualConstraint {
    /// Physical constraint name. May be absent for unnamed constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_schema: Option<SchemaName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<TableName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    pub columns: Vec<ConstraintColumn>,
}

impl ActualConstraint {
    /// Hydrated: at least one column pair with both sides present.
    pub fn is_hydrated(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.owner_column.is_some() && c.referenced_column.is_some())
    }

    /// The key used for metadata lookup, when the constraint is named.
    pub fn key(&self, schema: &SchemaName, table: &TableName) -> Option<RelationshipConstraintKey> {
        let name = self.name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        Some(RelationshipConstraintKey::new(
            schema.clone(),
            table.clone(),
            ColumnName::new(name).ok()?,
        ))
    }
}

/// One column pair of a constraint. Unhydrated pairs have empty sides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintColumn {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_column: Option<ColumnName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_attribute: Option<AttributeName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_column: Option<ColumnName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_attribute: Option<AttributeName>,
    pub ordinal: u32,
}

/// One trigger definition. Carried through emission untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
    pub name: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}
