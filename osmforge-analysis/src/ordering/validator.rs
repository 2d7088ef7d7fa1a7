//! Seed-order validation.
//!
//! The validator is order-independent of how seed rows were produced: it
//! relies exclusively on effective table names. Cycle detection runs over
//! the FK edges combined with the observed order, so an order that
//! contradicts a constraint surfaces as a cycle.

use osmforge_core::constants::UNNAMED_FOREIGN_KEY;
use osmforge_core::types::{FxHashMap, TableName};

use crate::model::Entity;
use crate::naming::EffectiveNameResolver;

use super::graph::{find_cycles, fk_edges, FkEdge};
use super::types::{OrderingViolation, TopologicalOrderingValidationResult};

/// Validate an emitted seed order against the hydrated model.
pub fn validate_order(
    order: &[TableName],
    entities: &[&Entity],
    resolver: &EffectiveNameResolver,
) -> TopologicalOrderingValidationResult {
    let position_of: FxHashMap<&TableName, usize> =
        order.iter().enumerate().map(|(i, n)| (n, i)).collect();

    let mut violations = Vec::new();
    let mut total_foreign_keys = 0usize;
    let mut validated_constraints = 0usize;
    let mut skipped_constraints = 0usize;
    let mut missing_edges = 0usize;

    for entity in entities {
        let child = resolver.for_entity(entity);
        let Some(&child_position) = position_of.get(&child) else {
            continue;
        };
        for relationship in &entity.relationships {
            if !relationship.has_database_constraint {
                continue;
            }
            for constraint in &relationship.actual_constraints {
                if !constraint.is_hydrated() {
                    total_foreign_keys += 1;
                    skipped_constraints += 1;
                    continue;
                }
                total_foreign_keys += 1;
                validated_constraints += 1;

                let parent_physical = constraint
                    .referenced_table
                    .clone()
                    .unwrap_or_else(|| relationship.to_table.clone());
                let parent = resolver.resolve(&parent_physical);
                if parent == child {
                    continue;
                }
                let foreign_key_name = constraint
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(UNNAMED_FOREIGN_KEY)
                    .to_string();

                match position_of.get(&parent) {
                    Some(&parent_position) => {
                        if child_position < parent_position {
                            violations.push(OrderingViolation::ChildBeforeParent {
                                child_table: child.as_str().to_string(),
                                parent_table: parent.as_str().to_string(),
                                foreign_key_name,
                                child_position: child_position as i64,
                                parent_position: parent_position as i64,
                            });
                        }
                    }
                    None => {
                        missing_edges += 1;
                        violations.push(OrderingViolation::MissingParent {
                            child_table: child.as_str().to_string(),
                            parent_table: parent.as_str().to_string(),
                            foreign_key_name,
                            child_position: child_position as i64,
                            parent_position: -1,
                        });
                    }
                }
            }
        }
    }

    // Combined precedence graph: FK edges plus the observed order chain.
    // An order contradicting a constraint closes a loop here.
    let nodes: Vec<TableName> = order.to_vec();
    let index_of: FxHashMap<TableName, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), i))
        .collect();
    let mut combined: Vec<FkEdge> = fk_edges(entities, resolver)
        .into_iter()
        .filter(|e| index_of.contains_key(&e.child) && index_of.contains_key(&e.parent))
        .collect();
    for pair in order.windows(2) {
        // Later tables depend on earlier ones in the observed order. These
        // synthetic edges carry no FK name and stay out of cycle reports.
        combined.push(FkEdge {
            child: pair[1].clone(),
            parent: pair[0].clone(),
            name: String::new(),
        });
    }
    let cycles = find_cycles(&nodes, &combined, &index_of);
    let cycle_detected = !cycles.is_empty();

    let is_valid = !violations.iter().any(OrderingViolation::is_fatal);

    TopologicalOrderingValidationResult {
        is_valid,
        violations,
        total_entities: order.len(),
        total_foreign_keys,
        missing_edges,
        validated_constraints,
        skipped_constraints,
        cycle_detected,
        cycles,
    }
}
