//! Data provider contracts consumed during seed and insert emission.

use osmforge_core::types::{ColumnName, EntityName, SchemaName, TableName};

/// One value cell of a seed row.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedValue {
    Null,
    Int(i64),
    /// Decimals travel as rendered strings to avoid float drift.
    Decimal(String),
    Bool(bool),
    String(String),
    /// ISO-8601 date or datetime text.
    DateTime(String),
    Binary(Vec<u8>),
}

/// What the emitter asks the provider for.
#[derive(Debug, Clone)]
pub struct StaticEntityDefinition {
    pub module: String,
    pub logical_name: EntityName,
    pub schema: SchemaName,
    pub physical_table: TableName,
    pub effective_table: TableName,
    pub columns: Vec<ColumnName>,
    /// Identifier column used as the merge/existence key.
    pub key_column: Option<ColumnName>,
}

/// Rows for one static entity. Row order is provider-defined and is
/// normalized by the emitter, so providers may return rows in any order.
#[derive(Debug, Clone)]
pub struct StaticEntityTableData {
    pub logical_name: EntityName,
    pub rows: Vec<Vec<SeedValue>>,
}

/// Contract for the static entity data source.
pub trait StaticEntityDataProvider {
    fn get_data(
        &self,
        definitions: &[StaticEntityDefinition],
    ) -> Result<Vec<StaticEntityTableData>, String>;
}

/// Request for a dynamic entity extraction.
#[derive(Debug, Clone)]
pub struct DynamicExtractionRequest {
    pub entities: Vec<StaticEntityDefinition>,
}

/// Extracted insert statements for one dynamic entity.
#[derive(Debug, Clone)]
pub struct DynamicEntityRows {
    pub logical_name: EntityName,
    pub insert_statements: Vec<String>,
}

/// Result of a dynamic entity extraction.
#[derive(Debug, Clone, Default)]
pub struct DynamicEntityExtractionResult {
    pub entities: Vec<DynamicEntityRows>,
}

/// Contract for the dynamic entity data source.
pub trait DynamicEntityDataProvider {
    fn extract(
        &self,
        request: &DynamicExtractionRequest,
    ) -> Result<DynamicEntityExtractionResult, String>;
}
