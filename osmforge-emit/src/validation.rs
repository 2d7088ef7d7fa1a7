//! Parse-validation of emitted SQL scripts.
//!
//! Every emitted script must survive a permissive T-SQL parse. `GO` is a
//! batch separator, not SQL, so scripts are split on it before parsing.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sqlparser::dialect::MsSqlDialect;
use sqlparser::parser::Parser;

/// One parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlValidationError {
    pub file: String,
    pub message: String,
}

/// Summary across all validated scripts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlValidationSummary {
    pub total_files: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub errors: Vec<SqlValidationError>,
}

/// Validate a set of `(relative_path, content)` scripts.
/// `parallelism` bounds the fan-out; `None` means no limit.
pub fn validate_scripts(
    scripts: &[(String, String)],
    parallelism: Option<usize>,
) -> SqlValidationSummary {
    let validate_all = || -> Vec<(usize, Vec<SqlValidationError>)> {
        scripts
            .par_iter()
            .map(|(file, content)| validate_one(file, content))
            .collect()
    };

    // Results come back in input order regardless of completion order.
    let per_file = match parallelism {
        Some(1) => scripts
            .iter()
            .map(|(file, content)| validate_one(file, content))
            .collect(),
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(validate_all),
            Err(_) => validate_all(),
        },
        None => validate_all(),
    };

    let mut summary = SqlValidationSummary {
        total_files: scripts.len(),
        ..Default::default()
    };
    for (warnings, errors) in per_file {
        summary.warning_count += warnings;
        summary.error_count += errors.len();
        summary.errors.extend(errors);
    }
    summary
}

/// Returns (warning count, errors) for one script.
fn validate_one(file: &str, content: &str) -> (usize, Vec<SqlValidationError>) {
    let mut warnings = 0usize;
    let mut errors = Vec::new();

    let batches: Vec<&str> = split_batches(content);
    if batches.is_empty() {
        warnings += 1;
    }
    for batch in batches {
        if let Err(e) = Parser::parse_sql(&MsSqlDialect {}, batch) {
            errors.push(SqlValidationError {
                file: file.to_string(),
                message: e.to_string(),
            });
        }
    }
    (warnings, errors)
}

/// Split a script on `GO` separator lines, dropping comment-only batches.
fn split_batches(content: &str) -> Vec<&str> {
    let mut batches = Vec::new();
    let mut start = 0usize;
    let mut offset = 0usize;
    for line in content.split_inclusive('\n') {
        if line.trim().eq_ignore_ascii_case("go") {
            push_batch(&mut batches, &content[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    push_batch(&mut batches, &content[start..]);
    batches
}

fn push_batch<'a>(batches: &mut Vec<&'a str>, batch: &'a str) {
    let meaningful = batch
        .lines()
        .any(|l| !l.trim().is_empty() && !l.trim().starts_with("--"));
    if meaningful {
        batches.push(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_scripts_produce_no_errors() {
        let scripts = vec![
            (
                "a.sql".to_string(),
                "CREATE TABLE [dbo].[T] (\n    [ID] INT NOT NULL\n);\nGO\n".to_string(),
            ),
            (
                "b.sql".to_string(),
                "INSERT INTO [dbo].[T] ([ID]) VALUES (1);\nGO\n".to_string(),
            ),
        ];
        let summary = validate_scripts(&scripts, Some(1));
        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.error_count, 0);
    }

    #[test]
    fn broken_script_reports_its_file() {
        let scripts = vec![(
            "broken.sql".to_string(),
            "CREATE TABEL oops (;\nGO\n".to_string(),
        )];
        let summary = validate_scripts(&scripts, Some(1));
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.errors[0].file, "broken.sql");
    }

    #[test]
    fn go_separators_split_batches() {
        let batches = split_batches("SELECT 1;\nGO\nSELECT 2;\ngo\nSELECT 3;\n");
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn comment_only_file_counts_as_warning() {
        let scripts = vec![("empty.sql".to_string(), "-- no rows\n".to_string())];
        let summary = validate_scripts(&scripts, Some(1));
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.error_count, 0);
    }

    #[test]
    fn parallel_validation_matches_sequential() {
        let scripts: Vec<(String, String)> = (0..8)
            .map(|i| {
                (
                    format!("s{i}.sql"),
                    format!("INSERT INTO [dbo].[T] ([ID]) VALUES ({i});\nGO\n"),
                )
            })
            .collect();
        let sequential = validate_scripts(&scripts, Some(1));
        let parallel = validate_scripts(&scripts, None);
        assert_eq!(sequential.error_count, parallel.error_count);
        assert_eq!(sequential.total_files, parallel.total_files);
    }
}
