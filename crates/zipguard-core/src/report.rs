//! Extraction reporting and job hooks.

use std::time::Duration;

use crate::Result;
use crate::error::EntryReadError;
use crate::extraction::CancellationToken;
use crate::types::EntryDescriptor;
use crate::types::EntryKind;

/// Report of an extraction job.
///
/// Contains statistics about what was written and what was skipped.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of regular files written, or checked in a dry run.
    pub files_extracted: usize,

    /// Number of directory entries processed.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Total bytes of file content written.
    pub bytes_written: u64,

    /// Platform metadata entries (`__MACOSX/`) that were skipped.
    pub entries_skipped: usize,

    /// Entry errors that were ignored instead of failing the job.
    pub errors_ignored: usize,

    /// Duration of the job.
    pub duration: Duration,

    /// Whether the job ran in dry-run mode.
    pub dry_run: bool,

    /// Warnings generated during extraction.
    pub warnings: Vec<String>,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Counts one written entry of `kind`.
    pub fn record_written(&mut self, kind: EntryKind, bytes: u64) {
        match kind {
            EntryKind::File => self.files_extracted += 1,
            EntryKind::Directory => self.directories_created += 1,
            EntryKind::Symlink => self.symlinks_created += 1,
        }
        self.bytes_written = self.bytes_written.saturating_add(bytes);
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Caller hooks invoked by an extraction job.
///
/// All methods have no-op defaults. The trait requires `Send` so a job can
/// run on a worker thread.
///
/// # Examples
///
/// ```
/// use zipguard_core::ExtractionHooks;
/// use zipguard_core::ExtractionReport;
/// use zipguard_core::Result;
/// use zipguard_core::extraction::CancellationToken;
/// use zipguard_core::types::EntryDescriptor;
///
/// struct StopAfter(usize);
///
/// impl ExtractionHooks for StopAfter {
///     fn on_entry(&mut self, entry: &EntryDescriptor, cancel: &CancellationToken) {
///         println!("extracting {}", entry.name);
///         self.0 = self.0.saturating_sub(1);
///         if self.0 == 0 {
///             cancel.cancel();
///         }
///     }
///
///     fn on_complete(&mut self, outcome: &Result<ExtractionReport>) {
///         println!("done: {}", outcome.is_ok());
///     }
/// }
/// ```
pub trait ExtractionHooks: Send {
    /// Called once per entry after its path has been proven safe and before
    /// anything is written. Cancelling `cancel` stops the job before the
    /// entry is written.
    fn on_entry(&mut self, _entry: &EntryDescriptor, _cancel: &CancellationToken) {}

    /// Decides whether an archive-level read error is fatal.
    ///
    /// Returning `false` skips the entry and continues. The default treats
    /// every such error as fatal.
    fn on_entry_error(&mut self, _error: &EntryReadError) -> bool {
        true
    }

    /// Called exactly once with the job's final outcome.
    fn on_complete(&mut self, _outcome: &Result<ExtractionReport>) {}
}

/// Hooks implementation that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl ExtractionHooks for NoopHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report() {
        let report = ExtractionReport::new();
        assert_eq!(report.files_extracted, 0);
        assert_eq!(report.directories_created, 0);
        assert_eq!(report.bytes_written, 0);
        assert!(!report.has_warnings());
        assert!(!report.dry_run);
    }

    #[test]
    fn test_record_written() {
        let mut report = ExtractionReport::new();
        report.record_written(EntryKind::File, 10);
        report.record_written(EntryKind::File, 5);
        report.record_written(EntryKind::Directory, 0);
        report.record_written(EntryKind::Symlink, 0);
        assert_eq!(report.files_extracted, 2);
        assert_eq!(report.bytes_written, 15);
        assert_eq!(report.directories_created, 1);
        assert_eq!(report.symlinks_created, 1);
    }

    #[test]
    fn test_add_warning() {
        let mut report = ExtractionReport::new();
        report.add_warning("skipped ../evil".to_string());
        assert!(report.has_warnings());
    }

    #[test]
    fn test_noop_hooks_defaults() {
        let mut hooks = NoopHooks;
        let cancel = CancellationToken::new();
        hooks.on_entry(&EntryDescriptor::new("a"), &cancel);
        assert!(!cancel.is_cancelled());
        assert!(hooks.on_entry_error(&EntryReadError::malformed("bad")));
    }
}
