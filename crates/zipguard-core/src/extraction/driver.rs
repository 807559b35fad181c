//! Sequential extraction state machine.
//!
//! The driver pulls one entry at a time from an [`EntrySource`], resolves
//! it and writes it before asking for the next. Keeping a single entry in
//! flight is what makes the path checks sound: the canonical location of an
//! entry is computed only after every earlier entry has finished, so a
//! symlink created by entry N is visible when entry N+1 is resolved.

use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

use super::CancellationToken;
use super::dirs::ensure_dir;
use super::writer::EntryWriter;
use crate::ExtractOptions;
use crate::ExtractionError;
use crate::ExtractionHooks;
use crate::ExtractionReport;
use crate::Result;
use crate::error::EntryReadError;
use crate::error::FsOp;
use crate::security::ModeResolver;
use crate::security::PathResolver;
use crate::security::ResolvedMode;
use crate::source::EntrySource;
use crate::types::EntryDescriptor;
use crate::types::ExtractionRoot;
use crate::types::ResolvedTarget;

/// Driver lifecycle.
///
/// `Closing` and `Failed` are terminal. Every transition into `Failed` cancels
/// the job token so hooks and writers observing it stop as well.
#[derive(Debug)]
enum DriverState {
    ReadingEntry,
    ResolvingPath(EntryDescriptor),
    Writing {
        entry: EntryDescriptor,
        target: ResolvedTarget,
        mode: ResolvedMode,
    },
    Closing,
    Failed(ExtractionError),
}

/// Runs one extraction job over an entry source.
///
/// # Examples
///
/// ```no_run
/// use zipguard_core::ExtractOptions;
/// use zipguard_core::NoopHooks;
/// use zipguard_core::extraction::CancellationToken;
/// use zipguard_core::extraction::Driver;
/// use zipguard_core::source::ZipSource;
/// use zipguard_core::types::ExtractionRoot;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = ExtractOptions::new("/tmp/out");
/// let root = ExtractionRoot::open(options.dir())?;
/// let mut source = ZipSource::open("archive.zip")?;
/// let mut hooks = NoopHooks;
///
/// let report = Driver::new(&root, &options, &mut hooks, CancellationToken::new())
///     .run(&mut source)?;
/// println!("{} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub struct Driver<'a> {
    options: &'a ExtractOptions,
    hooks: &'a mut dyn ExtractionHooks,
    cancel: CancellationToken,
    paths: PathResolver<'a>,
    modes: ModeResolver,
    writer: EntryWriter,
    report: ExtractionReport,
    /// Symlinks a dry run accepted but did not create.
    planned_links: Vec<PathBuf>,
}

impl<'a> Driver<'a> {
    /// Prepares a job. The process umask is captured here, once.
    pub fn new(
        root: &'a ExtractionRoot,
        options: &'a ExtractOptions,
        hooks: &'a mut dyn ExtractionHooks,
        cancel: CancellationToken,
    ) -> Self {
        let report = ExtractionReport {
            dry_run: options.dry_run,
            ..ExtractionReport::default()
        };
        Self {
            options,
            hooks,
            cancel,
            paths: PathResolver::new(root),
            modes: ModeResolver::new(options),
            writer: EntryWriter::new(options.dry_run),
            report,
            planned_links: Vec::new(),
        }
    }

    /// Replaces the mode resolver, e.g. to pin the umask.
    #[must_use]
    pub fn with_mode_resolver(mut self, modes: ModeResolver) -> Self {
        self.modes = modes;
        self
    }

    /// Processes every entry of `source`, then closes it.
    ///
    /// The source is closed exactly once whether the job succeeds or fails.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error. Entries written before the failure
    /// are left in place.
    pub fn run<S>(mut self, source: &mut S) -> Result<ExtractionReport>
    where
        S: EntrySource + ?Sized,
    {
        let mut state = DriverState::ReadingEntry;
        loop {
            state = match state {
                DriverState::ReadingEntry => self.read_entry(source),
                DriverState::ResolvingPath(entry) => self.resolve_entry(entry),
                DriverState::Writing {
                    entry,
                    target,
                    mode,
                } => self.write_entry(source, &entry, &target, &mode),
                DriverState::Closing => {
                    source.close();
                    debug!(
                        files = self.report.files_extracted,
                        directories = self.report.directories_created,
                        symlinks = self.report.symlinks_created,
                        "extraction finished"
                    );
                    return Ok(self.report);
                }
                DriverState::Failed(err) => {
                    self.cancel.cancel();
                    source.close();
                    debug!(error = %err, "extraction failed");
                    return Err(err);
                }
            };
        }
    }

    fn read_entry<S>(&mut self, source: &mut S) -> DriverState
    where
        S: EntrySource + ?Sized,
    {
        if let Err(err) = self.cancel.check() {
            return DriverState::Failed(err);
        }
        match source.next_entry() {
            None => DriverState::Closing,
            Some(Ok(entry)) => DriverState::ResolvingPath(entry),
            Some(Err(err)) => self.handle_read_error(err),
        }
    }

    fn handle_read_error(&mut self, err: EntryReadError) -> DriverState {
        if self.options.ignore_invalid_paths && err.is_invalid_path() {
            warn!(error = %err, "ignoring invalid entry path");
            self.report.errors_ignored += 1;
            self.report.add_warning(format!("ignored: {err}"));
            return DriverState::ReadingEntry;
        }

        if self.hooks.on_entry_error(&err) {
            DriverState::Failed(ExtractionError::Entry(err))
        } else {
            warn!(error = %err, "entry error skipped by caller");
            self.report.errors_ignored += 1;
            self.report.add_warning(format!("skipped: {err}"));
            DriverState::ReadingEntry
        }
    }

    fn resolve_entry(&mut self, entry: EntryDescriptor) -> DriverState {
        match self.try_resolve(&entry) {
            Ok(Some((target, mode))) => DriverState::Writing {
                entry,
                target,
                mode,
            },
            Ok(None) => {
                debug!(entry = %entry.name, "skipping metadata entry");
                self.report.entries_skipped += 1;
                DriverState::ReadingEntry
            }
            Err(err) if self.options.ignore_invalid_paths && err.is_ignorable_path_error() => {
                warn!(entry = %entry.name, error = %err, "ignoring invalid entry path");
                self.report.errors_ignored += 1;
                self.report.add_warning(format!("ignored: {err}"));
                DriverState::ReadingEntry
            }
            Err(err) => DriverState::Failed(err),
        }
    }

    fn try_resolve(
        &self,
        entry: &EntryDescriptor,
    ) -> Result<Option<(ResolvedTarget, ResolvedMode)>> {
        let Some(planned) = self.paths.plan(&entry.name)? else {
            return Ok(None);
        };
        let mode = self.modes.resolve(entry);

        // Nothing exists on disk beneath a link the dry run skipped, and
        // creating a directory there would block the real run's symlink.
        if self.is_under_planned_link(planned.parent()) {
            return Ok(Some((self.paths.lexical_target(&planned), mode)));
        }

        // Created in dry runs too so later entries resolve against it.
        ensure_dir(planned.parent())
            .map_err(|e| ExtractionError::fs(FsOp::CreateDir, planned.parent(), e))?;

        let target = self.paths.confirm(&planned, mode.kind)?;
        Ok(Some((target, mode)))
    }

    fn is_under_planned_link(&self, parent: &Path) -> bool {
        self.planned_links.iter().any(|link| parent.starts_with(link))
    }

    fn write_entry<S>(
        &mut self,
        source: &mut S,
        entry: &EntryDescriptor,
        target: &ResolvedTarget,
        mode: &ResolvedMode,
    ) -> DriverState
    where
        S: EntrySource + ?Sized,
    {
        self.hooks.on_entry(entry, &self.cancel);
        if let Err(err) = self.cancel.check() {
            return DriverState::Failed(err);
        }

        match self.writer.write(target, mode, source, &self.cancel) {
            Ok(bytes) => {
                debug!(entry = %entry.name, kind = ?mode.kind, bytes, "entry done");
                self.report.record_written(mode.kind, bytes);
                if self.options.dry_run && mode.kind.is_symlink() {
                    self.planned_links.push(target.dest().to_path_buf());
                }
                DriverState::ReadingEntry
            }
            Err(err) => DriverState::Failed(err),
        }
    }
}
