//! Canonical extraction root.

use crate::ExtractionError;
use crate::Result;
use crate::error::FsOp;
use crate::extraction::dirs::ensure_dir;
use std::path::Path;
use std::path::PathBuf;

/// The canonical, symlink-resolved destination directory of a job.
///
/// Resolved exactly once while the job opens and never changed afterwards;
/// every containment check compares against this path.
///
/// # Examples
///
/// ```no_run
/// use zipguard_core::types::ExtractionRoot;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = ExtractionRoot::open("/tmp/extraction")?;
/// println!("Extracting to: {}", root.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRoot(PathBuf);

impl ExtractionRoot {
    /// Validates, creates and canonicalizes the destination.
    ///
    /// The absolute-path check runs before any filesystem mutation, so a
    /// relative destination is never created.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::RelativeDestination` if `dir` is not absolute
    /// - `ExtractionError::Fs` if it cannot be created or canonicalized
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_absolute() {
            return Err(ExtractionError::RelativeDestination {
                path: dir.to_path_buf(),
            });
        }

        tracing::debug!(dir = %dir.display(), "creating target directory");
        ensure_dir(dir).map_err(|e| ExtractionError::fs(FsOp::CreateDir, dir, e))?;

        let canonical = dir
            .canonicalize()
            .map_err(|e| ExtractionError::fs(FsOp::Canonicalize, dir, e))?;

        Ok(Self(canonical))
    }

    /// Returns the canonical root path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns `true` if `canonical` is the root or nested beneath it.
    ///
    /// `canonical` must already be symlink-resolved.
    #[inline]
    #[must_use]
    pub fn contains(&self, canonical: &Path) -> bool {
        canonical.starts_with(&self.0)
    }
}
