//! Supplemental model merge.
//!
//! Supplemental entities extend the primary model. Entities land in their
//! module by case-insensitive name; unseen modules are appended at the end.
//! On a logical-name clash the primary entity wins and a warning is emitted.

use super::types::{Module, OsmModel};

/// Merge supplemental modules into the primary model in place.
/// Returns the warnings produced by clash resolution.
pub fn merge_supplemental(primary: &mut OsmModel, supplemental: OsmModel) -> Vec<String> {
    let mut warnings = Vec::new();

    for extra_module in supplemental.modules {
        match primary
            .modules
            .iter_mut()
            .find(|m| m.name == extra_module.name)
        {
            Some(target) => {
                for entity in extra_module.entities {
                    let clash = target
                        .entities
                        .iter()
                        .any(|e| e.logical_name == entity.logical_name);
                    if clash {
                        warnings.push(format!(
                            "model.schema.warnings: supplemental entity '{}' in module '{}' duplicates a primary entity and was ignored",
                            entity.logical_name, target.name
                        ));
                    } else {
                        target.entities.push(entity);
                    }
                }
            }
            None => primary.modules.push(Module {
                name: extra_module.name,
                is_system: extra_module.is_system,
                is_active: extra_module.is_active,
                entities: extra_module.entities,
            }),
        }
    }

    warnings
}
