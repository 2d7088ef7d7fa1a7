//! Script rendering — tables, literals, seeds, project file.

pub mod literals;
pub mod seeds;
pub mod sqlproj;
pub mod table;

pub use literals::SqlLiteralFormatter;
pub use seeds::{generate_static_seeds, SeedGeneration};
pub use sqlproj::render_sqlproj;
pub use table::render_table_script;

/// Bracket-quote an identifier, doubling closing brackets.
pub(crate) fn bracket(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}
