//! Extraction job configuration.

use std::path::Path;
use std::path::PathBuf;

use crate::ExtractionError;
use crate::Result;

/// Permission bits applied to directories whose entry records none (0755).
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Permission bits applied to files whose entry records none (0644).
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Behavior flags for one extraction job.
///
/// Only the destination directory is required; everything else has a
/// conservative default.
///
/// # Examples
///
/// ```
/// use zipguard_core::ExtractOptions;
///
/// let options = ExtractOptions::new("/tmp/out")
///     .with_dry_run(true)
///     .with_ignore_invalid_paths(true);
/// assert!(options.dry_run);
/// assert_eq!(options.default_file_mode, 0o644);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Destination directory. Must be absolute.
    pub dir: PathBuf,

    /// Resolve and check every entry, create parent directories for
    /// bookkeeping, but write no file content or symlinks.
    pub dry_run: bool,

    /// Skip entries whose names are invalid or escape the destination
    /// instead of failing the job.
    pub ignore_invalid_paths: bool,

    /// Permission bits for directories without recorded mode.
    pub default_dir_mode: u32,

    /// Permission bits for files without recorded mode.
    pub default_file_mode: u32,
}

impl Default for ExtractOptions {
    /// Creates options with an empty destination, which fails validation
    /// until [`ExtractOptions::dir`] is set.
    fn default() -> Self {
        Self {
            dir: PathBuf::new(),
            dry_run: false,
            ignore_invalid_paths: false,
            default_dir_mode: DEFAULT_DIR_MODE,
            default_file_mode: DEFAULT_FILE_MODE,
        }
    }
}

impl ExtractOptions {
    /// Creates options extracting into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Sets dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets whether invalid entry paths are skipped.
    #[must_use]
    pub fn with_ignore_invalid_paths(mut self, ignore: bool) -> Self {
        self.ignore_invalid_paths = ignore;
        self
    }

    /// Sets the default directory mode from an octal string such as `"0755"`.
    pub fn with_default_dir_mode(mut self, mode: &str) -> Result<Self> {
        self.default_dir_mode = parse_mode("defaultDirMode", mode)?;
        Ok(self)
    }

    /// Sets the default file mode from an octal string such as `"0644"`.
    pub fn with_default_file_mode(mut self, mode: &str) -> Result<Self> {
        self.default_file_mode = parse_mode("defaultFileMode", mode)?;
        Ok(self)
    }

    /// Returns the destination directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Checks the preconditions that must hold before any filesystem
    /// mutation.
    pub fn validate(&self) -> Result<()> {
        if !self.dir.is_absolute() {
            return Err(ExtractionError::RelativeDestination {
                path: self.dir.clone(),
            });
        }
        Ok(())
    }
}

/// Parses an octal permission string (`"755"`, `"0755"`, `"0o755"`).
///
/// Values must fit in the permission bits (`0o7777`).
///
/// # Examples
///
/// ```
/// use zipguard_core::config::parse_mode;
///
/// assert_eq!(parse_mode("defaultDirMode", "0755").unwrap(), 0o755);
/// assert!(parse_mode("defaultDirMode", "rwx").is_err());
/// ```
pub fn parse_mode(field: &'static str, value: &str) -> Result<u32> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
        .unwrap_or(trimmed);

    let invalid = || ExtractionError::InvalidMode {
        field,
        value: value.to_string(),
    };

    if digits.is_empty() {
        return Err(invalid());
    }

    let mode = u32::from_str_radix(digits, 8).map_err(|_| invalid())?;
    if mode > 0o7777 {
        return Err(invalid());
    }
    Ok(mode)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(!options.dry_run);
        assert!(!options.ignore_invalid_paths);
        assert_eq!(options.default_dir_mode, 0o755);
        assert_eq!(options.default_file_mode, 0o644);
    }

    #[test]
    fn test_validate_rejects_relative() {
        let options = ExtractOptions::new("relative/out");
        assert!(matches!(
            options.validate(),
            Err(ExtractionError::RelativeDestination { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(ExtractOptions::default().validate().is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_accepts_absolute() {
        assert!(ExtractOptions::new("/tmp/out").validate().is_ok());
    }

    #[test]
    fn test_parse_mode_variants() {
        assert_eq!(parse_mode("m", "755").unwrap(), 0o755);
        assert_eq!(parse_mode("m", "0644").unwrap(), 0o644);
        assert_eq!(parse_mode("m", "0o700").unwrap(), 0o700);
        assert_eq!(parse_mode("m", " 600 ").unwrap(), 0o600);
        assert_eq!(parse_mode("m", "0").unwrap(), 0);
    }

    #[test]
    fn test_parse_mode_rejects_garbage() {
        assert!(parse_mode("m", "").is_err());
        assert!(parse_mode("m", "0o").is_err());
        assert!(parse_mode("m", "789").is_err());
        assert!(parse_mode("m", "17777").is_err());
        assert!(parse_mode("m", "-1").is_err());
    }

    #[test]
    fn test_builder_modes() {
        let options = ExtractOptions::new("/tmp/out")
            .with_default_dir_mode("0700")
            .unwrap()
            .with_default_file_mode("600")
            .unwrap();
        assert_eq!(options.default_dir_mode, 0o700);
        assert_eq!(options.default_file_mode, 0o600);
    }

    #[test]
    fn test_builder_mode_error_names_field() {
        let err = ExtractOptions::new("/tmp/out")
            .with_default_file_mode("abc")
            .unwrap_err();
        assert!(err.to_string().contains("defaultFileMode"));
    }
}
