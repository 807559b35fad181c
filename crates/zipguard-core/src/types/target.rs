//! Planned and resolved destination paths for a single entry.

use std::path::Path;
use std::path::PathBuf;

/// Destination computed lexically from an entry name, before any
/// directory has been created.
///
/// Only [`PathResolver::plan`](crate::security::PathResolver::plan) produces
/// values of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPath {
    name: String,
    dest: PathBuf,
    parent: PathBuf,
}

impl PlannedPath {
    pub(crate) fn new(name: String, dest: PathBuf, parent: PathBuf) -> Self {
        Self { name, dest, parent }
    }

    /// Raw entry name this plan was made for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lexically normalized destination path.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Lexical parent of the destination, created before confirmation.
    #[must_use]
    pub fn parent(&self) -> &Path {
        &self.parent
    }
}

/// A destination whose canonical parent has been proven to lie inside
/// the extraction root.
///
/// Computed fresh for every entry and never cached, since an earlier entry
/// may have replaced a directory with a symlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    name: String,
    dest: PathBuf,
    canonical_parent: PathBuf,
    relative_parent: PathBuf,
}

impl ResolvedTarget {
    pub(crate) fn new(
        name: String,
        dest: PathBuf,
        canonical_parent: PathBuf,
        relative_parent: PathBuf,
    ) -> Self {
        Self {
            name,
            dest,
            canonical_parent,
            relative_parent,
        }
    }

    /// Raw entry name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Destination path to create.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Canonical (symlink-resolved) parent directory.
    #[must_use]
    pub fn canonical_parent(&self) -> &Path {
        &self.canonical_parent
    }

    /// Canonical parent relative to the canonical root; empty when the
    /// parent is the root itself.
    #[must_use]
    pub fn relative_parent(&self) -> &Path {
        &self.relative_parent
    }

    /// Always `true`: a `ResolvedTarget` only exists for contained parents.
    #[must_use]
    pub fn is_contained(&self) -> bool {
        !self
            .relative_parent
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    }
}
