//! Static seed script generation.
//!
//! Tables are emitted in dependency order (parents first); row order inside
//! a table is normalized by rendered literals, so provider row order never
//! reaches the output bytes.

use osmforge_analysis::model::{Entity, OsmModel};
use osmforge_analysis::naming::{EffectiveNameResolver, ModuleFolder};
use osmforge_analysis::ordering::order_static_seeds;
use osmforge_core::config::{EmissionOptions, SynchronizationMode};
use osmforge_core::constants::MASTER_SEED_FILE_NAME;
use osmforge_core::errors::{EmitError, ErrorCode, OrderingError, StepResult};
use osmforge_core::types::{EntityName, FxHashMap, TableName};

use crate::providers::{StaticEntityDataProvider, StaticEntityDefinition, StaticEntityTableData};
use crate::smo::SmoModel;

use super::bracket;
use super::literals::SqlLiteralFormatter;

/// Everything the seed stage produced.
#[derive(Debug, Clone, Default)]
pub struct SeedGeneration {
    /// Relative path → content, in emission order.
    pub files: Vec<(String, String)>,
    /// Global topological order of effective table names.
    pub order: Vec<TableName>,
    pub table_count: usize,
    pub row_count: usize,
}

/// Generate the static seed script set.
#[allow(clippy::too_many_arguments)]
pub fn generate_static_seeds(
    model: &OsmModel,
    smo: &SmoModel,
    provider: &dyn StaticEntityDataProvider,
    formatter: &SqlLiteralFormatter,
    options: &EmissionOptions,
    resolver: &EffectiveNameResolver,
    folders: &[ModuleFolder],
) -> StepResult<SeedGeneration> {
    let static_entities: Vec<&Entity> = model.entities().filter(|e| e.is_static).collect();
    if static_entities.is_empty() {
        return Ok(SeedGeneration::default());
    }

    let ordering = order_static_seeds(&static_entities, resolver);
    if ordering.cycle_detected {
        let tables = ordering
            .cycles
            .iter()
            .flat_map(|c| c.tables_in_cycle.iter().cloned())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(vec![OrderingError::CycleDetected { tables }.to_validation()]);
    }

    let folder_of: FxHashMap<&str, &str> = folders
        .iter()
        .map(|f| (f.original_name.as_str(), f.disambiguated_name.as_str()))
        .collect();

    let definitions: Vec<StaticEntityDefinition> = static_entities
        .iter()
        .filter_map(|entity| {
            let table = smo
                .tables
                .iter()
                .find(|t| t.logical_name == entity.logical_name && t.module == entity.module)?;
            Some(StaticEntityDefinition {
                module: entity.module.as_str().to_string(),
                logical_name: entity.logical_name.clone(),
                schema: entity.schema.clone(),
                physical_table: entity.table_name.clone(),
                effective_table: table.effective_name.clone(),
                columns: table.columns.iter().map(|c| c.name.clone()).collect(),
                key_column: table
                    .primary_key
                    .as_ref()
                    .and_then(|pk| pk.columns.first().cloned()),
            })
        })
        .collect();

    let data = provider.get_data(&definitions).map_err(|reason| {
        vec![EmitError::ProviderFailed {
            entity: "<static entities>".to_string(),
            reason,
        }
        .to_validation()]
    })?;
    let rows_by_entity: FxHashMap<&EntityName, &StaticEntityTableData> =
        data.iter().map(|d| (&d.logical_name, d)).collect();

    // Emit table blocks in global dependency order.
    let mut generation = SeedGeneration {
        order: ordering.ordered.clone(),
        ..Default::default()
    };
    let mut file_contents: Vec<(String, String)> = Vec::new();
    let mut master = String::new();

    for effective in &ordering.ordered {
        let Some(definition) = definitions
            .iter()
            .find(|d| &d.effective_table == effective)
        else {
            continue;
        };
        let mut rows: Vec<Vec<crate::providers::SeedValue>> = rows_by_entity
            .get(&definition.logical_name)
            .map(|d| d.rows.clone())
            .unwrap_or_default();
        // Normalize row order: the output must not depend on the provider.
        rows.sort_by_key(|row| formatter.format_row(row));

        generation.table_count += 1;
        generation.row_count += rows.len();

        let block = render_table_seed(definition, &rows, formatter, options.synchronization_mode);

        let folder = folder_of
            .get(definition.module.as_str())
            .copied()
            .unwrap_or(definition.module.as_str());
        let relative_path = if options.group_by_module {
            format!("Seeds/{folder}/{folder}.seed.sql")
        } else {
            format!(
                "Seeds/{folder}.{}.seed.sql",
                definition.logical_name.as_str()
            )
        };
        match file_contents.iter_mut().find(|(p, _)| p == &relative_path) {
            Some((_, content)) => content.push_str(&block),
            None => file_contents.push((relative_path, block.clone())),
        }
        if options.emit_master_file {
            master.push_str(&block);
        }
    }

    if options.emit_master_file {
        file_contents.push((format!("BaselineSeeds/{MASTER_SEED_FILE_NAME}"), master));
    }

    generation.files = file_contents;
    Ok(generation)
}

fn render_table_seed(
    definition: &StaticEntityDefinition,
    rows: &[Vec<crate::providers::SeedValue>],
    formatter: &SqlLiteralFormatter,
    mode: SynchronizationMode,
) -> String {
    let qualified = format!(
        "{}.{}",
        bracket(definition.schema.as_str()),
        bracket(definition.effective_table.as_str())
    );
    let mut block = format!(
        "-- Seed data for {}.{} ({qualified})\n",
        definition.module,
        definition.logical_name
    );
    if rows.is_empty() {
        block.push_str("-- no rows\n");
        return block;
    }

    let column_list = definition
        .columns
        .iter()
        .map(|c| bracket(c.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let key_index = key_column_index(definition);
    let key_name = bracket(definition.columns[key_index].as_str());

    match mode {
        SynchronizationMode::NonDestructive => {
            let values = rows
                .iter()
                .map(|row| format!("    {}", formatter.format_row(row)))
                .collect::<Vec<_>>()
                .join(",\n");
            block.push_str(&format!(
                "MERGE INTO {qualified} AS target\nUSING (VALUES\n{values}\n) AS source ({column_list})\nON target.{key_name} = source.{key_name}\n"
            ));
            let updates: Vec<String> = definition
                .columns
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != key_index)
                .map(|(_, c)| {
                    let col = bracket(c.as_str());
                    format!("target.{col} = source.{col}")
                })
                .collect();
            if !updates.is_empty() {
                block.push_str(&format!(
                    "WHEN MATCHED THEN UPDATE SET {}\n",
                    updates.join(", ")
                ));
            }
            let source_list = definition
                .columns
                .iter()
                .map(|c| format!("source.{}", bracket(c.as_str())))
                .collect::<Vec<_>>()
                .join(", ");
            block.push_str(&format!(
                "WHEN NOT MATCHED THEN INSERT ({column_list}) VALUES ({source_list});\nGO\n"
            ));
        }
        SynchronizationMode::ValidateThenApply => {
            for row in rows {
                let key_literal = formatter.format(&row[key_index]);
                block.push_str(&format!(
                    "IF NOT EXISTS (SELECT 1 FROM {qualified} WHERE {key_name} = {key_literal})\n    INSERT INTO {qualified} ({column_list}) VALUES {};\nGO\n",
                    formatter.format_row(row)
                ));
            }
        }
        SynchronizationMode::Authoritative => {
            let values = rows
                .iter()
                .map(|row| format!("    {}", formatter.format_row(row)))
                .collect::<Vec<_>>()
                .join(",\n");
            block.push_str(&format!(
                "TRUNCATE TABLE {qualified};\nINSERT INTO {qualified} ({column_list}) VALUES\n{values};\nGO\n"
            ));
        }
    }
    block
}

fn key_column_index(definition: &StaticEntityDefinition) -> usize {
    definition
        .key_column
        .as_ref()
        .and_then(|key| definition.columns.iter().position(|c| c == key))
        .unwrap_or(0)
}
