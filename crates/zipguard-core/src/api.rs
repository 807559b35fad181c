//! High-level public API for ZIP extraction.

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::ExtractOptions;
use crate::ExtractionHooks;
use crate::ExtractionReport;
use crate::NoopHooks;
use crate::Result;
use crate::extraction::CancellationToken;
use crate::extraction::Driver;
use crate::source::EntrySource;
use crate::source::ZipSource;
use crate::types::ExtractionRoot;

/// Extracts a ZIP archive into `options.dir`.
///
/// This is the main high-level API. Every entry is proven to stay inside
/// the destination before anything is written for it.
///
/// # Errors
///
/// Returns an error if:
/// - The destination is not absolute or cannot be created
/// - The archive cannot be opened
/// - An entry path is invalid or escapes the destination (unless
///   `ignore_invalid_paths` is set)
/// - I/O operations fail
///
/// # Examples
///
/// ```no_run
/// use zipguard_core::ExtractOptions;
/// use zipguard_core::extract_zip;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = ExtractOptions::new("/tmp/output");
/// let report = extract_zip("archive.zip", &options)?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_zip<P: AsRef<Path>>(
    archive_path: P,
    options: &ExtractOptions,
) -> Result<ExtractionReport> {
    extract_zip_with_hooks(archive_path, options, &mut NoopHooks)
}

/// Extracts a ZIP archive, reporting to `hooks`.
///
/// [`ExtractionHooks::on_complete`] is called exactly once, including when
/// the job fails before the archive is opened.
///
/// # Errors
///
/// Same as [`extract_zip`].
pub fn extract_zip_with_hooks<P: AsRef<Path>>(
    archive_path: P,
    options: &ExtractOptions,
    hooks: &mut dyn ExtractionHooks,
) -> Result<ExtractionReport> {
    Extraction::new(options.clone()).run_zip(archive_path, hooks)
}

/// A configured extraction job.
///
/// Holds the options and the cancellation token; the token can be cloned
/// and handed to another thread before the job runs.
///
/// # Examples
///
/// ```no_run
/// use zipguard_core::ExtractOptions;
/// use zipguard_core::NoopHooks;
/// use zipguard_core::api::Extraction;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let job = Extraction::new(ExtractOptions::new("/tmp/output"));
/// let cancel = job.cancellation_token();
/// std::thread::spawn(move || {
///     std::thread::sleep(std::time::Duration::from_secs(5));
///     cancel.cancel();
/// });
/// job.run_zip("large.zip", &mut NoopHooks)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Extraction {
    options: ExtractOptions,
    cancel: CancellationToken,
}

impl Extraction {
    /// Creates a job with a fresh cancellation token.
    #[must_use]
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` instead of the job's own token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a handle that cancels this job.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the job options.
    #[must_use]
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Opens the ZIP archive at `archive_path` and extracts it.
    ///
    /// The destination is validated and created before the archive is
    /// opened.
    ///
    /// # Errors
    ///
    /// Same as [`extract_zip`].
    pub fn run_zip<P: AsRef<Path>>(
        &self,
        archive_path: P,
        hooks: &mut dyn ExtractionHooks,
    ) -> Result<ExtractionReport> {
        let archive_path = archive_path.as_ref();
        info!(archive = %archive_path.display(), dest = %self.options.dir.display(), "extracting");
        self.execute(hooks, |driver| {
            let mut source = ZipSource::open(archive_path)?;
            driver.run(&mut source)
        })
    }

    /// Extracts entries from an already opened source.
    ///
    /// # Errors
    ///
    /// Same as [`extract_zip`], minus archive opening failures.
    pub fn run_source<S>(
        &self,
        source: &mut S,
        hooks: &mut dyn ExtractionHooks,
    ) -> Result<ExtractionReport>
    where
        S: EntrySource + ?Sized,
    {
        self.execute(hooks, |driver| driver.run(source))
    }

    fn execute<F>(&self, hooks: &mut dyn ExtractionHooks, job: F) -> Result<ExtractionReport>
    where
        F: FnOnce(Driver<'_>) -> Result<ExtractionReport>,
    {
        let started = Instant::now();
        let mut outcome = self.start(&mut *hooks, job);

        match &mut outcome {
            Ok(report) => {
                report.duration = started.elapsed();
                info!(
                    files = report.files_extracted,
                    bytes = report.bytes_written,
                    duration_ms = report.duration.as_millis(),
                    "extraction complete"
                );
            }
            Err(err) => info!(error = %err, "extraction aborted"),
        }

        hooks.on_complete(&outcome);
        outcome
    }

    fn start<F>(&self, hooks: &mut dyn ExtractionHooks, job: F) -> Result<ExtractionReport>
    where
        F: FnOnce(Driver<'_>) -> Result<ExtractionReport>,
    {
        self.options.validate()?;
        let root = ExtractionRoot::open(self.options.dir())?;
        job(Driver::new(&root, &self.options, hooks, self.cancel.clone()))
    }
}
