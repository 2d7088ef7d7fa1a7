//! SQL snippets for the safe and remediation bundles.

use osmforge_core::types::{ColumnName, SchemaName, TableName};

use super::types::ForeignKeyAction;

/// Bracket-quote an identifier, doubling closing brackets.
pub fn bracket(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// `[schema].[table]`
pub fn qualified(schema: &SchemaName, table: &TableName) -> String {
    format!("{}.{}", bracket(schema.as_str()), bracket(table.as_str()))
}

/// Safe tightening: make an evidenced column NOT NULL.
pub fn alter_not_null(
    schema: &SchemaName,
    table: &TableName,
    column: &ColumnName,
    physical_type: &str,
) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} {} NOT NULL;",
        qualified(schema, table),
        bracket(column.as_str()),
        physical_type
    )
}

/// Remediation: backfill nulls before a NOT NULL can be applied.
pub fn backfill_nulls(
    schema: &SchemaName,
    table: &TableName,
    column: &ColumnName,
    default_literal: &str,
) -> String {
    let qualified = qualified(schema, table);
    let column = bracket(column.as_str());
    format!("UPDATE {qualified} SET {column} = {default_literal} WHERE {column} IS NULL;")
}

/// Safe tightening: enforce an evidenced unique candidate.
pub fn create_unique_index(
    index_name: &str,
    schema: &SchemaName,
    table: &TableName,
    columns: &[&ColumnName],
) -> String {
    let column_list = columns
        .iter()
        .map(|c| bracket(c.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE UNIQUE INDEX {} ON {} ({});",
        bracket(index_name),
        qualified(schema, table),
        column_list
    )
}

/// Remediation: surface duplicate groups blocking a unique index.
pub fn list_duplicates(schema: &SchemaName, table: &TableName, column: &ColumnName) -> String {
    let qualified = qualified(schema, table);
    let column = bracket(column.as_str());
    format!(
        "SELECT {column}, COUNT(*) AS DuplicateCount FROM {qualified} GROUP BY {column} HAVING COUNT(*) > 1;"
    )
}

/// Safe tightening: add an evidenced foreign key constraint.
#[allow(clippy::too_many_arguments)]
pub fn add_foreign_key(
    schema: &SchemaName,
    table: &TableName,
    constraint_name: &str,
    owner_columns: &[&ColumnName],
    referenced_schema: &SchemaName,
    referenced_table: &TableName,
    referenced_columns: &[&ColumnName],
    on_delete: ForeignKeyAction,
) -> String {
    let owner_list = owner_columns
        .iter()
        .map(|c| bracket(c.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let referenced_list = referenced_columns
        .iter()
        .map(|c| bracket(c.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "ALTER TABLE {} WITH CHECK ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        qualified(schema, table),
        bracket(constraint_name),
        owner_list,
        qualified(referenced_schema, referenced_table),
        referenced_list
    );
    if on_delete != ForeignKeyAction::NoAction {
        sql.push_str(&format!(" ON DELETE {}", on_delete.as_sql()));
    }
    sql.push(';');
    sql
}

/// Remediation: delete orphan rows blocking a foreign key.
pub fn delete_orphans(
    schema: &SchemaName,
    table: &TableName,
    owner_column: &ColumnName,
    referenced_schema: &SchemaName,
    referenced_table: &TableName,
    referenced_column: &ColumnName,
) -> String {
    let child = qualified(schema, table);
    let parent = qualified(referenced_schema, referenced_table);
    let owner = bracket(owner_column.as_str());
    let referenced = bracket(referenced_column.as_str());
    format!(
        "DELETE c FROM {child} c WHERE c.{owner} IS NOT NULL AND NOT EXISTS (SELECT 1 FROM {parent} p WHERE p.{referenced} = c.{owner});"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_doubles_closing_brackets() {
        assert_eq!(bracket("plain"), "[plain]");
        assert_eq!(bracket("odd]name"), "[odd]]name]");
    }

    #[test]
    fn alter_not_null_renders_type_and_target() {
        let sql = alter_not_null(
            &SchemaName::dbo(),
            &TableName::new("OSUSR_ABC_CUSTOMER").unwrap(),
            &ColumnName::new("EMAIL").unwrap(),
            "NVARCHAR(250)",
        );
        assert_eq!(
            sql,
            "ALTER TABLE [dbo].[OSUSR_ABC_CUSTOMER] ALTER COLUMN [EMAIL] NVARCHAR(250) NOT NULL;"
        );
    }
}
