//! Validated name types and physical coordinates.
//! All name equality in the pipeline is case-insensitive.

pub mod collections;
pub mod coordinates;
pub mod names;

pub use collections::{FxHashMap, FxHashSet, SmallVec4};
pub use coordinates::{ColumnCoordinate, IndexCoordinate, RelationshipConstraintKey};
pub use names::{
    AttributeName, ColumnName, EntityName, ModuleName, NameError, SchemaName, TableName,
};
