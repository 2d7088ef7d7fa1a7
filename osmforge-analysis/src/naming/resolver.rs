//! Effective table name resolution.
//!
//! The effective name is the physical table name after naming overrides.
//! It feeds filenames, seed script headers, and FK dependency keys, so both
//! the physical and the overridden name must resolve to the same node.

use osmforge_core::config::NamingOverrideOptions;
use osmforge_core::types::{FxHashMap, TableName};

use crate::model::{Entity, OsmModel};

/// Resolver caching effective names per physical table (case-insensitive).
#[derive(Debug, Default)]
pub struct EffectiveNameResolver {
    by_physical: FxHashMap<TableName, TableName>,
}

impl EffectiveNameResolver {
    /// Precompute effective names for every entity in the model.
    pub fn build(model: &OsmModel, overrides: &NamingOverrideOptions) -> Self {
        let mut by_physical = FxHashMap::default();
        for entity in model.entities() {
            let effective = overrides.effective_table_name(
                &entity.schema,
                &entity.table_name,
                &entity.module,
                &entity.logical_name,
            );
            by_physical.insert(entity.table_name.clone(), effective);
        }
        Self { by_physical }
    }

    /// Effective name for an entity.
    pub fn for_entity(&self, entity: &Entity) -> TableName {
        self.resolve(&entity.table_name)
    }

    /// Effective name for a physical table. Unknown tables resolve to
    /// themselves so references outside the model still produce a key.
    pub fn resolve(&self, physical: &TableName) -> TableName {
        self.by_physical
            .get(physical)
            .cloned()
            .unwrap_or_else(|| physical.clone())
    }

    /// The physical → effective pairs that actually changed, for the rename map.
    pub fn renames(&self) -> Vec<(TableName, TableName)> {
        let mut renames: Vec<(TableName, TableName)> = self
            .by_physical
            .iter()
            .filter(|(physical, effective)| physical != effective)
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();
        renames.sort_by(|a, b| a.0.cmp(&b.0));
        renames
    }
}
