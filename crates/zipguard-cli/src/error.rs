//! Error conversion utilities for CLI.
//!
//! Converts zipguard-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use zipguard_core::ExtractionError;

/// Converts `ExtractionError` to user-friendly anyhow error with context
pub fn convert_extraction_error(err: ExtractionError, archive: &Path) -> anyhow::Error {
    match err {
        ExtractionError::PathEscape { name, resolved } => {
            anyhow!(
                "Security violation: entry '{}' in '{}' resolves outside the destination ({})\n\
                 HINT: This archive may be malicious. Use --ignore-invalid-paths to skip such entries.",
                name,
                archive.display(),
                resolved.display()
            )
        }
        ExtractionError::InvalidPath { name, reason } => {
            anyhow!(
                "Invalid entry path {:?} in '{}': {}\n\
                 HINT: Use --ignore-invalid-paths to skip entries with unsafe names.",
                name,
                archive.display(),
                reason
            )
        }
        ExtractionError::Entry(entry_err) if entry_err.is_invalid_path() => {
            anyhow!(
                "Archive '{}' contains an unsafe entry name: {}\n\
                 HINT: Use --ignore-invalid-paths to skip entries with unsafe names.",
                archive.display(),
                entry_err
            )
        }
        ExtractionError::Entry(entry_err) => {
            anyhow!(
                "Invalid archive '{}': {}\n\
                 HINT: The archive may be corrupted or truncated.",
                archive.display(),
                entry_err
            )
        }
        ExtractionError::Open { path, reason } => {
            anyhow!(
                "Cannot open archive '{}': {}\n\
                 HINT: Check that the file exists and is a ZIP archive.",
                path.display(),
                reason
            )
        }
        ExtractionError::RelativeDestination { path } => {
            anyhow!(
                "Destination must be an absolute path: {}",
                path.display()
            )
        }
        ExtractionError::PermissionDenied { path, source } => {
            anyhow!(
                "Permission denied writing '{}' from '{}': {}\n\
                 HINT: Check write permissions on the destination directory.",
                path.display(),
                archive.display(),
                source
            )
        }
        ExtractionError::Cancelled => anyhow!("Extraction of '{}' cancelled", archive.display()),
        other @ ExtractionError::Fs { .. } => {
            anyhow!(
                "I/O error while processing '{}': {}",
                archive.display(),
                other
            )
        }
        _ => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Adds context to a generic error about archive operations
pub fn add_archive_context<T>(
    result: Result<T, ExtractionError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_extraction_error(e, archive))
}
