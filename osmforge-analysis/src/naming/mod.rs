//! Effective table names and module folder naming.

pub mod folders;
pub mod resolver;

pub use folders::{assign_module_folders, sanitize_module_name, ModuleFolder};
pub use resolver::EffectiveNameResolver;
