//! Static-seed dependency ordering and validation.

pub mod graph;
pub mod types;
pub mod validator;

pub use graph::order_static_seeds;
pub use types::{Cycle, OrderingViolation, TopologicalOrdering, TopologicalOrderingValidationResult};
pub use validator::validate_order;
