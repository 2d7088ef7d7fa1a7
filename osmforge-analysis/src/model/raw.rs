//! Wire-shaped model types.
//!
//! These mirror the extraction JSON exactly. Mandatory arrays deserialize to
//! `Option<Vec<_>>` so a null (or missing) array is distinguishable and can
//! fail the contract check. Unknown fields are captured, not rejected.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
    pub exported_at_utc: Option<DateTime<Utc>>,
    pub modules: Option<Vec<RawModule>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModule {
    pub name: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub entities: Option<Vec<RawEntity>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntity {
    pub name: String,
    pub physical_name: String,
    #[serde(rename = "db_schema")]
    pub db_schema: Option<String>,
    pub catalog: Option<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub attributes: Option<Vec<RawAttribute>>,
    pub relationships: Option<Vec<RawRelationship>>,
    pub indexes: Option<Vec<RawIndex>>,
    pub triggers: Option<Vec<RawTrigger>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttribute {
    pub name: String,
    pub physical_name: String,
    pub data_type: String,
    pub length: Option<u32>,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub is_identifier: bool,
    #[serde(default)]
    pub is_auto_number: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub reference: Option<RawReference>,
    pub reality: Option<RawReality>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReference {
    pub to_entity: String,
    pub to_table: Option<String>,
    pub delete_rule: Option<String>,
    #[serde(default)]
    pub has_database_constraint: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReality {
    pub observed_default: Option<String>,
    pub observed_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRelationship {
    pub via_attribute: String,
    pub to_entity: String,
    pub to_table: String,
    pub delete_rule_code: Option<String>,
    #[serde(default)]
    pub has_database_constraint: bool,
    #[serde(default)]
    pub actual_constraints: Vec<RawConstraint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConstraint {
    pub name: Option<String>,
    pub referenced_schema: Option<String>,
    pub referenced_table: Option<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    #[serde(default)]
    pub columns: Vec<RawConstraintColumn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConstraintColumn {
    pub owner_column: Option<String>,
    pub owner_attribute: Option<String>,
    pub referenced_column: Option<String>,
    pub referenced_attribute: Option<String>,
    #[serde(default)]
    pub ordinal: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndex {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub is_unique: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrigger {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub definition: Option<String>,
}

fn default_true() -> bool {
    true
}
