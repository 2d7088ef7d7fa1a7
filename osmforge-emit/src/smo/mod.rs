//! The in-memory physical model ("SMO") emitted to disk.

pub mod build;
pub mod types;

pub use build::build_smo_model;
pub use types::{SmoColumn, SmoForeignKey, SmoIndex, SmoModel, SmoPrimaryKey, SmoTable};
