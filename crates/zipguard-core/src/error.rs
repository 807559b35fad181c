//! Error types for archive extraction operations.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Coarse classification of an [`ExtractionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Job configuration is invalid (e.g. relative destination).
    Config,
    /// Archive could not be opened or parsed.
    Open,
    /// Entry name cannot be represented or resolves outside the root.
    InvalidPath,
    /// Canonical parent of an entry escapes the root.
    PathEscape,
    /// Directory, file or symlink operation failed.
    Io,
    /// Write was denied even after relaxing permissions.
    PermissionDenied,
    /// Archive-level read error for a single entry.
    Archive,
    /// Job was cancelled from outside.
    Cancelled,
}

/// Why an entry name was rejected by the path resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidPathReason {
    /// Empty entry name.
    Empty,
    /// Name contains NUL or a backslash.
    InvalidCharacters,
    /// Name is an absolute path or carries a drive prefix.
    Absolute,
    /// Lexical normalization climbs above the extraction root.
    OutsideRoot,
}

impl fmt::Display for InvalidPathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty file name"),
            Self::InvalidCharacters => write!(f, "invalid characters in file name"),
            Self::Absolute => write!(f, "absolute path"),
            Self::OutsideRoot => write!(f, "resolves outside the destination"),
        }
    }
}

/// Classification of archive-level read errors, assigned once by the
/// archive reader adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryErrorKind {
    /// Entry name contains characters that cannot be represented.
    InvalidCharacters,
    /// Entry name is absolute.
    AbsolutePath,
    /// Entry name contains a `..` segment.
    InvalidRelativePath,
    /// Entry record is malformed or unreadable.
    Malformed,
}

impl EntryErrorKind {
    /// Returns `true` for the invalid-path class of read errors.
    #[must_use]
    pub const fn is_invalid_path(self) -> bool {
        matches!(
            self,
            Self::InvalidCharacters | Self::AbsolutePath | Self::InvalidRelativePath
        )
    }
}

/// Error reported by an [`EntrySource`](crate::source::EntrySource) while
/// staging an entry or opening its content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EntryReadError {
    /// Structured classification of the error.
    pub kind: EntryErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl EntryReadError {
    /// Creates a new read error.
    pub fn new(kind: EntryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a `Malformed` read error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(EntryErrorKind::Malformed, message)
    }

    /// Returns `true` if this error belongs to the invalid-path class.
    #[must_use]
    pub const fn is_invalid_path(&self) -> bool {
        self.kind.is_invalid_path()
    }
}

/// Filesystem operation named in [`ExtractionError::Fs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    /// Creating a directory and its ancestors.
    CreateDir,
    /// Resolving a canonical path.
    Canonicalize,
    /// Opening or creating a file.
    CreateFile,
    /// Writing file content.
    Write,
    /// Creating a symbolic link.
    Symlink,
    /// Removing an existing entry.
    Remove,
    /// Reading entry content.
    Read,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::CreateDir => "create directory",
            Self::Canonicalize => "resolve",
            Self::CreateFile => "create file",
            Self::Write => "write",
            Self::Symlink => "create symlink",
            Self::Remove => "remove",
            Self::Read => "read content of",
        };
        f.write_str(op)
    }
}

/// Errors that can occur during archive extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Destination directory is not an absolute path.
    #[error("target directory is expected to be absolute: {path}")]
    RelativeDestination {
        /// The rejected destination.
        path: PathBuf,
    },

    /// A configured permission mode could not be parsed.
    #[error("invalid {field}: {value:?} is not an octal permission mode")]
    InvalidMode {
        /// Configuration key.
        field: &'static str,
        /// Rejected value.
        value: String,
    },

    /// No archive was given to the builder.
    #[error("archive path not set")]
    MissingArchive,

    /// Archive cannot be opened or its central directory is unreadable.
    #[error("failed to open archive {path}: {reason}")]
    Open {
        /// Archive path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Entry name violates containment before touching the filesystem.
    #[error("invalid path {name:?}: {reason}")]
    InvalidPath {
        /// Raw entry name.
        name: String,
        /// Why the name was rejected.
        reason: InvalidPathReason,
    },

    /// Canonical location of an entry escapes the extraction root.
    #[error("out of bound path \"{resolved}\" found while processing file {name}")]
    PathEscape {
        /// Raw entry name.
        name: String,
        /// Canonical path that escaped.
        resolved: PathBuf,
    },

    /// Archive-level error while reading an entry.
    #[error("archive entry error: {0}")]
    Entry(#[from] EntryReadError),

    /// Filesystem operation failed for a specific path.
    #[error("failed to {op} {path}: {source}")]
    Fs {
        /// Failed operation.
        op: FsOp,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing was denied and the single relaxed retry failed too.
    #[error("permission denied writing {path}: {source}")]
    PermissionDenied {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Extraction was cancelled before completion.
    #[error("extraction cancelled")]
    Cancelled,
}

impl ExtractionError {
    /// Wraps an I/O error with the operation and path it belongs to.
    pub fn fs(op: FsOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns the coarse classification of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipguard_core::ExtractionError;
    /// use zipguard_core::error::ErrorKind;
    ///
    /// let err = ExtractionError::Cancelled;
    /// assert_eq!(err.kind(), ErrorKind::Cancelled);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RelativeDestination { .. } | Self::InvalidMode { .. } | Self::MissingArchive => {
                ErrorKind::Config
            }
            Self::Open { .. } => ErrorKind::Open,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::PathEscape { .. } => ErrorKind::PathEscape,
            Self::Entry(_) => ErrorKind::Archive,
            Self::Fs { .. } => ErrorKind::Io,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` for I/O failures, including permission denials.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self.kind(), ErrorKind::Io | ErrorKind::PermissionDenied)
    }

    /// Returns `true` if this error represents a containment violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use zipguard_core::ExtractionError;
    /// use std::path::PathBuf;
    ///
    /// let err = ExtractionError::PathEscape {
    ///     name: "link/file.txt".into(),
    ///     resolved: PathBuf::from("/outside"),
    /// };
    /// assert!(err.is_security_violation());
    /// assert!(!ExtractionError::Cancelled.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::InvalidPath { .. } | Self::PathEscape { .. })
    }

    /// Returns `true` if the error may be skipped when the caller opted into
    /// ignoring invalid paths.
    #[must_use]
    pub const fn is_ignorable_path_error(&self) -> bool {
        match self {
            Self::InvalidPath { .. } | Self::PathEscape { .. } => true,
            Self::Entry(err) => err.is_invalid_path(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_destination_display() {
        let err = ExtractionError::RelativeDestination {
            path: PathBuf::from("out"),
        };
        assert!(err.to_string().contains("absolute"));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_path_escape_names_entry() {
        let err = ExtractionError::PathEscape {
            name: "link/file.txt".into(),
            resolved: PathBuf::from("/tmp/outside"),
        };
        let display = err.to_string();
        assert!(display.contains("out of bound path"));
        assert!(display.contains("link/file.txt"));
        assert!(display.contains("/tmp/outside"));
    }

    #[test]
    fn test_permission_denied_is_io() {
        let err = ExtractionError::PermissionDenied {
            path: PathBuf::from("file"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(err.is_io());
        assert!(!err.is_security_violation());
    }

    #[test]
    fn test_fs_error_is_io() {
        let err = ExtractionError::fs(
            FsOp::Remove,
            "/tmp/x",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_io());
        assert!(err.to_string().starts_with("failed to remove /tmp/x"));
    }

    #[test]
    fn test_fs_error_display() {
        let err = ExtractionError::fs(
            FsOp::CreateDir,
            "/tmp/x",
            std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        );
        assert!(err.to_string().starts_with("failed to create directory /tmp/x"));
    }

    #[test]
    fn test_entry_error_classification() {
        let invalid = EntryReadError::new(EntryErrorKind::AbsolutePath, "absolute path: /etc");
        assert!(invalid.is_invalid_path());
        let err = ExtractionError::from(invalid);
        assert_eq!(err.kind(), ErrorKind::Archive);
        assert!(err.is_ignorable_path_error());

        let malformed = ExtractionError::from(EntryReadError::malformed("bad header"));
        assert!(!malformed.is_ignorable_path_error());
    }

    #[test]
    fn test_ignorable_path_errors() {
        let err = ExtractionError::InvalidPath {
            name: "../x".into(),
            reason: InvalidPathReason::OutsideRoot,
        };
        assert!(err.is_ignorable_path_error());
        assert!(!ExtractionError::Cancelled.is_ignorable_path_error());
    }
}
