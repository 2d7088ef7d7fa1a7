//! Logical model — types, JSON ingestion, filtering, merge, hydration.

pub mod hydrate;
pub mod ingest;
pub mod merge;
pub mod raw;
pub mod type_map;
pub mod types;

pub use hydrate::{ForeignKeyColumnMetadata, RelationshipConstraintMetadataProvider};
pub use ingest::{LoadOptions, LoadedModel};
pub use types::{
    ActualConstraint, Attribute, AttributeReference, ConstraintColumn, Entity, IndexDefinition,
    Module, OsmModel, Relationship, TriggerDefinition,
};
