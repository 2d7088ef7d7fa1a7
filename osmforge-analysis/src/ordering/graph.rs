//! FK dependency graph and Kahn ordering.
//!
//! Nodes are effective table names, case-insensitive. Edges run child →
//! parent for every relationship with a database constraint and at least one
//! hydrated column pair. Self-edges are ignored.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use osmforge_core::constants::UNNAMED_FOREIGN_KEY;
use osmforge_core::types::{FxHashMap, TableName};

use crate::model::Entity;
use crate::naming::EffectiveNameResolver;

use super::types::{Cycle, TopologicalOrdering};

/// One child → parent dependency with its FK name.
#[derive(Debug, Clone)]
pub(crate) struct FkEdge {
    pub child: TableName,
    pub parent: TableName,
    pub name: String,
}

/// Derive the hydrated FK edges of a set of entities, in model order.
pub(crate) fn fk_edges(entities: &[&Entity], resolver: &EffectiveNameResolver) -> Vec<FkEdge> {
    let mut edges = Vec::new();
    for entity in entities {
        let child = resolver.for_entity(entity);
        for relationship in &entity.relationships {
            if !relationship.has_database_constraint {
                continue;
            }
            for constraint in &relationship.actual_constraints {
                if !constraint.is_hydrated() {
                    continue;
                }
                let parent_physical = constraint
                    .referenced_table
                    .clone()
                    .unwrap_or_else(|| relationship.to_table.clone());
                let parent = resolver.resolve(&parent_physical);
                if parent == child {
                    // Self-references are valid and never ordered against.
                    continue;
                }
                let name = constraint
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(UNNAMED_FOREIGN_KEY)
                    .to_string();
                edges.push(FkEdge {
                    child: child.clone(),
                    parent,
                    name,
                });
            }
        }
    }
    edges
}

/// Order static-seed tables parents-first with a stable tie-break.
pub fn order_static_seeds(
    entities: &[&Entity],
    resolver: &EffectiveNameResolver,
) -> TopologicalOrdering {
    // Node set in model order, deduplicated case-insensitively.
    let mut nodes: Vec<TableName> = Vec::new();
    for entity in entities {
        let name = resolver.for_entity(entity);
        if !nodes.contains(&name) {
            nodes.push(name);
        }
    }
    let index_of: FxHashMap<TableName, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), i))
        .collect();

    // Dependencies within the node set only.
    let edges = fk_edges(entities, resolver);
    let mut parents_of: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for edge in &edges {
        let (Some(&child), Some(&parent)) = (index_of.get(&edge.child), index_of.get(&edge.parent))
        else {
            continue;
        };
        if !parents_of[child].contains(&parent) {
            parents_of[child].push(parent);
            children_of[parent].push(child);
        }
    }

    // Kahn over unsatisfied-parent counts; ties break on folded name.
    let mut remaining: Vec<usize> = parents_of.iter().map(|p| p.len()).collect();
    let mut ready: Vec<usize> = (0..nodes.len()).filter(|&i| remaining[i] == 0).collect();
    let mut ordered: Vec<TableName> = Vec::with_capacity(nodes.len());
    let mut emitted = vec![false; nodes.len()];

    while !ready.is_empty() {
        ready.sort_by(|&a, &b| nodes[a].folded().cmp(nodes[b].folded()));
        let next = ready.remove(0);
        emitted[next] = true;
        ordered.push(nodes[next].clone());
        for &child in &children_of[next] {
            remaining[child] -= 1;
            if remaining[child] == 0 {
                ready.push(child);
            }
        }
    }

    let cycle_detected = ordered.len() < nodes.len();
    let mut cycles = Vec::new();
    if cycle_detected {
        // Longest acyclic prefix first, then the cyclic remainder by name.
        let mut leftover: Vec<usize> = (0..nodes.len()).filter(|&i| !emitted[i]).collect();
        leftover.sort_by(|&a, &b| nodes[a].folded().cmp(nodes[b].folded()));
        for index in leftover {
            ordered.push(nodes[index].clone());
        }
        cycles = find_cycles(&nodes, &edges, &index_of);
    }

    TopologicalOrdering {
        ordered,
        cycle_detected,
        cycles,
    }
}

/// Strongly connected components with more than one node, as cycle reports.
pub(crate) fn find_cycles(
    nodes: &[TableName],
    edges: &[FkEdge],
    index_of: &FxHashMap<TableName, usize>,
) -> Vec<Cycle> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let petgraph_nodes: Vec<NodeIndex> = (0..nodes.len()).map(|i| graph.add_node(i)).collect();
    for edge in edges {
        let (Some(&child), Some(&parent)) = (index_of.get(&edge.child), index_of.get(&edge.parent))
        else {
            continue;
        };
        if child != parent {
            graph.add_edge(petgraph_nodes[child], petgraph_nodes[parent], ());
        }
    }

    let mut cycles = Vec::new();
    for component in tarjan_scc(&graph) {
        if component.len() < 2 {
            continue;
        }
        let mut members: Vec<usize> = component.iter().map(|n| graph[*n]).collect();
        members.sort_by(|&a, &b| nodes[a].folded().cmp(nodes[b].folded()));

        let tables_in_cycle: Vec<String> = members
            .iter()
            .map(|&i| nodes[i].as_str().to_string())
            .collect();
        let mut cycle_path = tables_in_cycle.clone();
        cycle_path.push(tables_in_cycle[0].clone());

        let member_set: Vec<&TableName> = members.iter().map(|&i| &nodes[i]).collect();
        let mut foreign_keys: Vec<String> = edges
            .iter()
            .filter(|e| {
                !e.name.is_empty()
                    && member_set.contains(&&e.child)
                    && member_set.contains(&&e.parent)
            })
            .map(|e| e.name.clone())
            .collect();
        foreign_keys.sort();
        foreign_keys.dedup();

        cycles.push(Cycle {
            tables_in_cycle,
            cycle_path,
            foreign_keys,
        });
    }
    cycles
}
