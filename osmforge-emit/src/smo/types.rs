//! Physical model types.

use osmforge_analysis::tightening::ForeignKeyAction;
use osmforge_core::types::{ColumnName, EntityName, ModuleName, SchemaName, TableName};

/// One emitted column.
#[derive(Debug, Clone)]
pub struct SmoColumn {
    pub name: ColumnName,
    pub sql_type: String,
    pub nullable: bool,
    pub identity: bool,
    pub default_definition: Option<String>,
}

/// Primary key constraint.
#[derive(Debug, Clone)]
pub struct SmoPrimaryKey {
    pub name: String,
    pub columns: Vec<ColumnName>,
}

/// Secondary index.
#[derive(Debug, Clone)]
pub struct SmoIndex {
    pub name: String,
    pub columns: Vec<ColumnName>,
    pub is_unique: bool,
}

/// Emitted foreign key constraint.
#[derive(Debug, Clone)]
pub struct SmoForeignKey {
    pub name: String,
    pub columns: Vec<ColumnName>,
    pub referenced_schema: SchemaName,
    /// Effective name of the referenced table.
    pub referenced_table: TableName,
    pub referenced_columns: Vec<ColumnName>,
    pub on_delete: ForeignKeyAction,
}

/// One emitted table.
#[derive(Debug, Clone)]
pub struct SmoTable {
    pub module: ModuleName,
    /// Disambiguated module folder this table's script lands in.
    pub module_folder: String,
    pub logical_name: EntityName,
    pub schema: SchemaName,
    pub physical_name: TableName,
    /// Physical name after naming overrides.
    pub effective_name: TableName,
    pub is_static: bool,
    pub is_external: bool,
    pub columns: Vec<SmoColumn>,
    pub primary_key: Option<SmoPrimaryKey>,
    pub indexes: Vec<SmoIndex>,
    pub foreign_keys: Vec<SmoForeignKey>,
}

/// The emitted model: tables in module/entity order.
#[derive(Debug, Clone, Default)]
pub struct SmoModel {
    pub tables: Vec<SmoTable>,
}

impl SmoModel {
    pub fn static_tables(&self) -> impl Iterator<Item = &SmoTable> {
        self.tables.iter().filter(|t| t.is_static)
    }
}
