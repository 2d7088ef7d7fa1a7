//! CREATE TABLE script rendering.
//!
//! Output is a pure function of the table value: bracketed identifiers,
//! four-space indent, one trailing newline, `GO` after every batch.

use crate::smo::SmoTable;
use osmforge_analysis::tightening::ForeignKeyAction;

use super::bracket;

/// Render the full per-table script: table, indexes, foreign keys.
pub fn render_table_script(table: &SmoTable) -> String {
    let mut script = String::new();
    let qualified = format!(
        "{}.{}",
        bracket(table.schema.as_str()),
        bracket(table.effective_name.as_str())
    );

    script.push_str(&format!("CREATE TABLE {qualified} (\n"));
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let mut line = format!("    {} {}", bracket(column.name.as_str()), column.sql_type);
            if column.identity {
                line.push_str(" IDENTITY(1,1)");
            }
            if let Some(default) = &column.default_definition {
                line.push_str(&format!(" DEFAULT {default}"));
            }
            line.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
            line
        })
        .collect();
    if let Some(pk) = &table.primary_key {
        lines.push(format!(
            "    CONSTRAINT {} PRIMARY KEY ({})",
            bracket(&pk.name),
            column_list(&pk.columns)
        ));
    }
    script.push_str(&lines.join(",\n"));
    script.push_str("\n);\nGO\n");

    for index in &table.indexes {
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        script.push_str(&format!(
            "CREATE {unique}INDEX {} ON {qualified} ({});\nGO\n",
            bracket(&index.name),
            column_list(&index.columns)
        ));
    }

    for fk in &table.foreign_keys {
        let mut statement = format!(
            "ALTER TABLE {qualified} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}.{} ({})",
            bracket(&fk.name),
            column_list(&fk.columns),
            bracket(fk.referenced_schema.as_str()),
            bracket(fk.referenced_table.as_str()),
            column_list(&fk.referenced_columns)
        );
        if fk.on_delete != ForeignKeyAction::NoAction {
            statement.push_str(&format!(" ON DELETE {}", fk.on_delete.as_sql()));
        }
        script.push_str(&statement);
        script.push_str(";\nGO\n");
    }

    script
}

fn column_list(columns: &[osmforge_core::types::ColumnName]) -> String {
    columns
        .iter()
        .map(|c| bracket(c.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}
