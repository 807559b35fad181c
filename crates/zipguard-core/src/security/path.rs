//! Path containment for archive entries.
//!
//! Resolution happens in two phases. [`PathResolver::plan`] works on the raw
//! name alone and rejects anything that cannot be represented or that
//! climbs out of the root lexically. After the driver has created the parent
//! directory, [`PathResolver::confirm`] canonicalizes it and proves the
//! symlink-resolved location is still inside the root. The second phase
//! catches escapes through symlinks created by earlier entries of the same
//! archive, which no amount of string inspection can detect.

use std::fs;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::ExtractionError;
use crate::Result;
use crate::error::FsOp;
use crate::error::InvalidPathReason;
use crate::types::EntryKind;
use crate::types::ExtractionRoot;
use crate::types::PlannedPath;
use crate::types::ResolvedTarget;

/// Upper bound on dangling symlinks followed while checking one entry.
const MAX_LINK_HOPS: usize = 40;

/// Prefix of resource-fork metadata entries written by the macOS archiver.
pub const METADATA_PREFIX: &str = "__MACOSX/";

/// Returns `true` for entries that are skipped without being resolved.
#[must_use]
pub fn is_metadata_entry(name: &str) -> bool {
    name.starts_with(METADATA_PREFIX)
}

/// Resolves entry names against a canonical extraction root.
///
/// # Examples
///
/// ```no_run
/// use zipguard_core::security::PathResolver;
/// use zipguard_core::types::EntryKind;
/// use zipguard_core::types::ExtractionRoot;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = ExtractionRoot::open("/tmp/out")?;
/// let resolver = PathResolver::new(&root);
///
/// let planned = resolver.plan("docs/readme.txt")?.expect("not a metadata entry");
/// std::fs::create_dir_all(planned.parent())?;
/// let target = resolver.confirm(&planned, EntryKind::File)?;
/// assert!(target.dest().starts_with(root.as_path()));
///
/// assert!(resolver.plan("../../etc/passwd").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    root: &'a ExtractionRoot,
}

impl<'a> PathResolver<'a> {
    /// Creates a resolver for `root`.
    #[must_use]
    pub fn new(root: &'a ExtractionRoot) -> Self {
        Self { root }
    }

    /// Computes the lexical destination of `name`.
    ///
    /// Returns `Ok(None)` for metadata entries, which are skipped.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::InvalidPath` if the name is empty, contains NUL or
    ///   a backslash, is absolute, or normalizes to a path above the root
    /// - `ExtractionError::PathEscape` if an existing ancestor of the parent
    ///   directory already resolves outside the root
    pub fn plan(&self, name: &str) -> Result<Option<PlannedPath>> {
        if is_metadata_entry(name) {
            return Ok(None);
        }

        let relative = normalize_entry_name(name)?;
        let dest = self.root.as_path().join(&relative);
        let parent = if relative.components().count() > 1 {
            dest.parent()
                .map_or_else(|| self.root.as_path().to_path_buf(), Path::to_path_buf)
        } else {
            self.root.as_path().to_path_buf()
        };

        self.check_existing_ancestors(name, &parent)?;

        Ok(Some(PlannedPath::new(name.to_string(), dest, parent)))
    }

    /// Proves that the now-existing parent of `planned` resolves inside the
    /// root.
    ///
    /// For regular files, an existing symlink at the destination must also
    /// resolve inside the root, since the write would follow it.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::PathEscape` if the canonical parent (or, for files,
    ///   the followed destination) lies outside the root
    /// - `ExtractionError::Fs` if the parent cannot be canonicalized
    pub fn confirm(&self, planned: &PlannedPath, kind: EntryKind) -> Result<ResolvedTarget> {
        let canonical_parent = planned
            .parent()
            .canonicalize()
            .map_err(|e| ExtractionError::fs(FsOp::Canonicalize, planned.parent(), e))?;

        let relative_parent = relative_path(self.root.as_path(), &canonical_parent);
        if relative_parent
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ExtractionError::PathEscape {
                name: planned.name().to_string(),
                resolved: canonical_parent,
            });
        }

        if kind.is_file() {
            self.check_existing_link(planned)?;
        }

        Ok(ResolvedTarget::new(
            planned.name().to_string(),
            planned.dest().to_path_buf(),
            canonical_parent,
            relative_parent,
        ))
    }

    /// Builds a target for `planned` without touching the filesystem.
    ///
    /// Used in dry runs when the parent lies beneath a symlink that was
    /// planned but not created, so there is nothing on disk to canonicalize.
    #[must_use]
    pub fn lexical_target(&self, planned: &PlannedPath) -> ResolvedTarget {
        let relative_parent = relative_path(self.root.as_path(), planned.parent());
        ResolvedTarget::new(
            planned.name().to_string(),
            planned.dest().to_path_buf(),
            planned.parent().to_path_buf(),
            relative_parent,
        )
    }

    /// Canonicalizes the deepest existing ancestor of `parent` so that
    /// directory creation never follows a symlink out of the root.
    ///
    /// A dangling symlink among the ancestors is followed by hand, since
    /// creating the missing directories would materialize its target.
    fn check_existing_ancestors(&self, name: &str, parent: &Path) -> Result<()> {
        self.check_ancestors_within(name, parent, MAX_LINK_HOPS)
    }

    fn check_ancestors_within(&self, name: &str, parent: &Path, hops: usize) -> Result<()> {
        let escape = |resolved| ExtractionError::PathEscape {
            name: name.to_string(),
            resolved,
        };

        for ancestor in parent.ancestors() {
            match ancestor.canonicalize() {
                Ok(canonical) if self.root.contains(&canonical) => return Ok(()),
                Ok(canonical) => return Err(escape(canonical)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    let Some(target) = dangling_link_target(ancestor) else {
                        continue;
                    };
                    if hops == 0 {
                        return Err(escape(target));
                    }
                    return self.check_ancestors_within(name, &target, hops - 1);
                }
                Err(e) => return Err(ExtractionError::fs(FsOp::Canonicalize, ancestor, e)),
            }
        }

        Ok(())
    }

    fn check_existing_link(&self, planned: &PlannedPath) -> Result<()> {
        let Ok(metadata) = planned.dest().symlink_metadata() else {
            return Ok(());
        };
        if !metadata.file_type().is_symlink() {
            return Ok(());
        }

        match planned.dest().canonicalize() {
            Ok(canonical) if self.root.contains(&canonical) => Ok(()),
            Ok(canonical) => Err(ExtractionError::PathEscape {
                name: planned.name().to_string(),
                resolved: canonical,
            }),
            // A dangling link would create its target wherever it points.
            Err(_) => Err(ExtractionError::PathEscape {
                name: planned.name().to_string(),
                resolved: planned.dest().to_path_buf(),
            }),
        }
    }
}

/// Returns the target of the dangling symlink at `path` joined onto its
/// parent, or `None` if `path` is not a symlink.
///
/// The join is not normalized so that `..` in the target is still resolved
/// by the filesystem, through any symlinks it crosses.
fn dangling_link_target(path: &Path) -> Option<PathBuf> {
    let metadata = path.symlink_metadata().ok()?;
    if !metadata.file_type().is_symlink() {
        return None;
    }
    let target = fs::read_link(path).ok()?;
    Some(path.parent().unwrap_or(Path::new("")).join(target))
}

/// Lexically normalizes a raw `/`-separated entry name into a relative path.
///
/// `.` segments and empty segments are dropped; `..` removes the previous
/// segment. The result never contains `..`.
///
/// # Errors
///
/// Returns `ExtractionError::InvalidPath` when the name cannot be
/// represented or leaves the root.
pub fn normalize_entry_name(name: &str) -> Result<PathBuf> {
    let invalid = |reason| ExtractionError::InvalidPath {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid(InvalidPathReason::Empty));
    }
    if name.contains(['\0', '\\']) {
        return Err(invalid(InvalidPathReason::InvalidCharacters));
    }
    if is_absolute_name(name) {
        return Err(invalid(InvalidPathReason::Absolute));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(invalid(InvalidPathReason::OutsideRoot));
                }
            }
            other => segments.push(other),
        }
    }

    let relative: PathBuf = segments.iter().collect();
    // A segment such as `C:` would turn into a prefix on some hosts.
    if relative.has_root()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(invalid(InvalidPathReason::Absolute));
    }
    Ok(relative)
}

fn is_absolute_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    name.starts_with('/')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
        || Path::new(name).is_absolute()
}

/// Computes the path leading from `base` to `target`, using `..` segments
/// where `target` is not beneath `base`. Both paths must be canonical.
#[must_use]
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base_components: Vec<Component<'_>> = base.components().collect();
    let target_components: Vec<Component<'_>> = target.components().collect();

    let common = base_components
        .iter()
        .zip(&target_components)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push(Component::ParentDir);
    }
    for component in &target_components[common..] {
        relative.push(component);
    }
    relative
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_root() -> (TempDir, ExtractionRoot) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = ExtractionRoot::open(temp.path()).expect("failed to open root");
        (temp, root)
    }

    #[test]
    fn test_normalize_simple() {
        assert_eq!(
            normalize_entry_name("a/b/c.txt").unwrap(),
            PathBuf::from("a/b/c.txt")
        );
        assert_eq!(normalize_entry_name("./a//b/").unwrap(), PathBuf::from("a/b"));
        assert_eq!(normalize_entry_name("a/../b").unwrap(), PathBuf::from("b"));
    }

    #[test]
    fn test_normalize_rejects_traversal() {
        for name in ["../x", "a/../../b", "../../etc/passwd", "a/b/../../../c"] {
            let err = normalize_entry_name(name).unwrap_err();
            assert!(
                matches!(
                    err,
                    ExtractionError::InvalidPath {
                        reason: InvalidPathReason::OutsideRoot,
                        ..
                    }
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalize_rejects_absolute() {
        for name in ["/etc/passwd", "C:/Windows", "c:evil"] {
            assert!(matches!(
                normalize_entry_name(name),
                Err(ExtractionError::InvalidPath {
                    reason: InvalidPathReason::Absolute,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_normalize_rejects_bad_characters() {
        assert!(matches!(
            normalize_entry_name("a\\b"),
            Err(ExtractionError::InvalidPath {
                reason: InvalidPathReason::InvalidCharacters,
                ..
            })
        ));
        assert!(normalize_entry_name("a\0b").is_err());
        assert!(normalize_entry_name("").is_err());
    }

    #[test]
    fn test_metadata_prefix() {
        assert!(is_metadata_entry("__MACOSX/._file"));
        assert!(!is_metadata_entry("docs/__MACOSX/file"));
        assert!(!is_metadata_entry("__MACOSX"));
    }

    #[test]
    fn test_plan_skips_metadata() {
        let (_temp, root) = create_test_root();
        let resolver = PathResolver::new(&root);
        assert!(resolver.plan("__MACOSX/._a.txt").unwrap().is_none());
    }

    #[test]
    fn test_plan_top_level_parent_is_root() {
        let (_temp, root) = create_test_root();
        let resolver = PathResolver::new(&root);
        let planned = resolver.plan("file.txt").unwrap().unwrap();
        assert_eq!(planned.parent(), root.as_path());
        assert_eq!(planned.dest(), root.as_path().join("file.txt"));

        let planned = resolver.plan("dir/").unwrap().unwrap();
        assert_eq!(planned.parent(), root.as_path());
    }

    #[test]
    fn test_plan_and_confirm_nested() {
        let (_temp, root) = create_test_root();
        let resolver = PathResolver::new(&root);
        let planned = resolver.plan("a/b/c.txt").unwrap().unwrap();
        fs::create_dir_all(planned.parent()).unwrap();
        let target = resolver.confirm(&planned, EntryKind::File).unwrap();
        assert_eq!(target.relative_parent(), Path::new("a/b"));
        assert!(target.is_contained());
    }

    #[test]
    #[cfg(unix)]
    fn test_plan_detects_symlinked_ancestor() {
        let (temp, root) = create_test_root();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        let resolver = PathResolver::new(&root);
        let err = resolver.plan("link/ccc/file.txt").unwrap_err();
        assert!(matches!(err, ExtractionError::PathEscape { .. }));
        assert!(!outside.path().join("ccc").exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_confirm_detects_escaped_parent() {
        let (temp, root) = create_test_root();
        let outside = TempDir::new().unwrap();
        let resolver = PathResolver::new(&root);

        // Planned while `link` was still a plain directory.
        fs::create_dir(temp.path().join("link")).unwrap();
        let planned = resolver.plan("link/file.txt").unwrap().unwrap();
        fs::remove_dir(temp.path().join("link")).unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        let err = resolver.confirm(&planned, EntryKind::File).unwrap_err();
        match err {
            ExtractionError::PathEscape { name, resolved } => {
                assert_eq!(name, "link/file.txt");
                assert_eq!(resolved, outside.path().canonicalize().unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_confirm_rejects_file_through_escaping_link() {
        let (temp, root) = create_test_root();
        let outside = TempDir::new().unwrap();
        let victim = outside.path().join("victim.txt");
        fs::write(&victim, "original").unwrap();
        std::os::unix::fs::symlink(&victim, temp.path().join("entry.txt")).unwrap();

        let resolver = PathResolver::new(&root);
        let planned = resolver.plan("entry.txt").unwrap().unwrap();
        assert!(matches!(
            resolver.confirm(&planned, EntryKind::File),
            Err(ExtractionError::PathEscape { .. })
        ));
        // Symlink entries replace the link instead of writing through it.
        assert!(resolver.confirm(&planned, EntryKind::Symlink).is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn test_confirm_rejects_dangling_link_for_files() {
        let (temp, root) = create_test_root();
        std::os::unix::fs::symlink("/nonexistent/zipguard/x", temp.path().join("d.txt")).unwrap();
        let resolver = PathResolver::new(&root);
        let planned = resolver.plan("d.txt").unwrap().unwrap();
        assert!(matches!(
            resolver.confirm(&planned, EntryKind::File),
            Err(ExtractionError::PathEscape { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_plan_follows_dangling_ancestor_link() {
        let (temp, root) = create_test_root();
        std::os::unix::fs::symlink("../outside/file.txt", temp.path().join("link")).unwrap();
        std::os::unix::fs::symlink("missing/inner", temp.path().join("local")).unwrap();

        let resolver = PathResolver::new(&root);
        let err = resolver.plan("link/file.txt").unwrap_err();
        assert!(matches!(err, ExtractionError::PathEscape { .. }));
        assert!(err.is_ignorable_path_error());

        // Dangling but pointing back inside the root.
        assert!(resolver.plan("local/file.txt").unwrap().is_some());
    }

    #[test]
    #[cfg(unix)]
    fn test_plan_follows_chained_dangling_links() {
        let (temp, root) = create_test_root();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("out")).unwrap();
        std::os::unix::fs::symlink("out/new", temp.path().join("hop")).unwrap();
        std::os::unix::fs::symlink("hop/deeper", temp.path().join("start")).unwrap();

        let resolver = PathResolver::new(&root);
        assert!(matches!(
            resolver.plan("start/file.txt"),
            Err(ExtractionError::PathEscape { .. })
        ));
        assert!(!outside.path().join("new").exists());
    }

    #[test]
    fn test_lexical_target_touches_nothing() {
        let (temp, root) = create_test_root();
        let resolver = PathResolver::new(&root);
        let planned = resolver.plan("link/a/b.txt").unwrap().unwrap();

        let target = resolver.lexical_target(&planned);
        assert_eq!(target.relative_parent(), Path::new("link/a"));
        assert!(target.is_contained());
        assert!(!temp.path().join("link").exists());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/a/b"), Path::new("/a/b/c/d")),
            PathBuf::from("c/d")
        );
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b")), PathBuf::new());
        assert_eq!(
            relative_path(Path::new("/a/b"), Path::new("/a/x")),
            PathBuf::from("../x")
        );
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/")), PathBuf::from("../.."));
    }
}
