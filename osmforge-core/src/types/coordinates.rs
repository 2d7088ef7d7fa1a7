//! Physical coordinates: (schema, table, …) triples used as decision keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::names::{ColumnName, SchemaName, TableName};

/// Fully qualified column position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCoordinate {
    pub schema: SchemaName,
    pub table: TableName,
    pub column: ColumnName,
}

impl ColumnCoordinate {
    pub fn new(schema: SchemaName, table: TableName, column: ColumnName) -> Self {
        Self {
            schema,
            table,
            column,
        }
    }
}

impl fmt::Display for ColumnCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.table, self.column)
    }
}

/// Fully qualified index position. The index name is compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexCoordinate {
    pub schema: SchemaName,
    pub table: TableName,
    pub index: ColumnName,
}

impl IndexCoordinate {
    pub fn new(schema: SchemaName, table: TableName, index: ColumnName) -> Self {
        Self {
            schema,
            table,
            index,
        }
    }
}

impl fmt::Display for IndexCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.table, self.index)
    }
}

/// Key identifying a relationship constraint on a table.
/// The constraint name participates case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipConstraintKey {
    pub schema: SchemaName,
    pub table: TableName,
    pub constraint_name: ColumnName,
}

impl RelationshipConstraintKey {
    pub fn new(schema: SchemaName, table: TableName, constraint_name: ColumnName) -> Self {
        Self {
            schema,
            table,
            constraint_name,
        }
    }
}

impl fmt::Display for RelationshipConstraintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.table, self.constraint_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_fold_case_in_every_segment() {
        let a = ColumnCoordinate::new(
            SchemaName::new("DBO").unwrap(),
            TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
            ColumnName::new("EMAIL").unwrap(),
        );
        let b = ColumnCoordinate::new(
            SchemaName::new("dbo").unwrap(),
            TableName::new("osusr_abc_customer").unwrap(),
            ColumnName::new("email").unwrap(),
        );
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "DBO.OSUSR_ABC_CUSTOMER.EMAIL");
    }
}
