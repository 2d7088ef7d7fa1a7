//! Ordering result and validation types.

use serde::{Deserialize, Serialize};

use osmforge_core::types::TableName;

/// One strongly connected component in the dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub tables_in_cycle: Vec<String>,
    /// One traversal of the cycle, first table repeated at the end.
    pub cycle_path: Vec<String>,
    /// Foreign key names participating in the cycle.
    pub foreign_keys: Vec<String>,
}

/// Deterministic topological ordering of static-seed tables.
#[derive(Debug, Clone)]
pub struct TopologicalOrdering {
    /// Effective table names, parents before children. When a cycle exists
    /// this is the longest acyclic prefix followed by the remainder.
    pub ordered: Vec<TableName>,
    pub cycle_detected: bool,
    pub cycles: Vec<Cycle>,
}

/// One ordering violation found by the validator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OrderingViolation {
    /// A child table is seeded before its parent. Invalidates the order.
    #[serde(rename_all = "camelCase")]
    ChildBeforeParent {
        child_table: String,
        parent_table: String,
        foreign_key_name: String,
        child_position: i64,
        parent_position: i64,
    },
    /// The referenced parent is not part of the seed set. Informational.
    #[serde(rename_all = "camelCase")]
    MissingParent {
        child_table: String,
        parent_table: String,
        foreign_key_name: String,
        child_position: i64,
        /// Always −1: the parent has no position.
        parent_position: i64,
    },
}

impl OrderingViolation {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ChildBeforeParent { .. })
    }
}

/// Structured validation result for an emitted seed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologicalOrderingValidationResult {
    pub is_valid: bool,
    pub violations: Vec<OrderingViolation>,
    pub total_entities: usize,
    pub total_foreign_keys: usize,
    pub missing_edges: usize,
    pub validated_constraints: usize,
    pub skipped_constraints: usize,
    pub cycle_detected: bool,
    pub cycles: Vec<Cycle>,
}
