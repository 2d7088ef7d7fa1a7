//! Telemetry packaging — zip archive of the run's key artifacts.

use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use osmforge_core::errors::EmitError;

/// The artifacts a telemetry archive carries, in archive order.
pub const DEFAULT_PACKAGE_ENTRIES: &[&str] = &[
    "manifest.json",
    "decision-log.json",
    "opportunities.json",
    "validations.json",
    "execution-log.json",
];

/// Zip the listed artifacts from `output_dir` into `archive_path`.
/// Absent artifacts are skipped; returns the entries actually packaged.
pub fn package_artifacts(
    archive_path: &Path,
    output_dir: &Path,
    entries: &[&str],
) -> Result<Vec<String>, EmitError> {
    let file = std::fs::File::create(archive_path).map_err(|source| EmitError::Io {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut packaged = Vec::new();
    for entry in entries {
        let source_path = output_dir.join(entry);
        if !source_path.exists() {
            continue;
        }
        let bytes = std::fs::read(&source_path).map_err(|source| EmitError::Io {
            path: source_path.clone(),
            source,
        })?;
        zip.start_file(*entry, options)
            .and_then(|_| zip.write_all(&bytes).map_err(zip::result::ZipError::Io))
            .map_err(|e| EmitError::Io {
                path: archive_path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
        packaged.push(entry.to_string());
    }

    zip.finish().map_err(|e| EmitError::Io {
        path: archive_path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Other, e),
    })?;
    Ok(packaged)
}
