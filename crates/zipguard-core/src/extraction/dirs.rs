//! Directory creation.

use std::fs;
use std::io;
use std::path::Path;

/// Creates `path` and any missing ancestors.
///
/// Succeeds when the directory already exists. Fails when `path` or one of
/// its ancestors exists and is not a directory.
///
/// # Errors
///
/// Returns the underlying I/O error if creation fails.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        // Another entry or process may have created it concurrently.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}
