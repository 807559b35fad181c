//! Builder for configuring ZIP extraction.

use std::path::Path;
use std::path::PathBuf;

use crate::ExtractOptions;
use crate::ExtractionError;
use crate::ExtractionHooks;
use crate::ExtractionReport;
use crate::NoopHooks;
use crate::Result;
use crate::api::Extraction;
use crate::extraction::CancellationToken;

/// Builder for configuring ZIP extraction.
///
/// # Examples
///
/// ```no_run
/// use zipguard_core::ExtractionBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = ExtractionBuilder::new()
///     .archive("archive.zip")
///     .output_dir("/tmp/output")
///     .ignore_invalid_paths(true)
///     .extract()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ExtractionBuilder {
    archive_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    options: Option<ExtractOptions>,
    dry_run: Option<bool>,
    ignore_invalid_paths: Option<bool>,
    cancel: Option<CancellationToken>,
}

impl ExtractionBuilder {
    /// Creates a new `ExtractionBuilder`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the archive file path.
    #[must_use]
    pub fn archive<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output directory, overriding `options.dir`.
    #[must_use]
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the base options.
    #[must_use]
    pub fn options(mut self, options: ExtractOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Overrides dry-run mode.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    /// Overrides whether invalid entry paths are skipped.
    #[must_use]
    pub fn ignore_invalid_paths(mut self, ignore: bool) -> Self {
        self.ignore_invalid_paths = Some(ignore);
        self
    }

    /// Sets the token used to cancel the job.
    #[must_use]
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Executes the extraction with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive path is not set, or if extraction
    /// fails.
    pub fn extract(self) -> Result<ExtractionReport> {
        self.extract_with_hooks(&mut NoopHooks)
    }

    /// Executes the extraction, reporting to `hooks`.
    ///
    /// # Errors
    ///
    /// Same as [`extract`](Self::extract).
    pub fn extract_with_hooks(self, hooks: &mut dyn ExtractionHooks) -> Result<ExtractionReport> {
        let (archive_path, job) = self.into_job()?;
        job.run_zip(archive_path, hooks)
    }

    fn into_job(self) -> Result<(PathBuf, Extraction)> {
        let archive_path = self.archive_path.ok_or(ExtractionError::MissingArchive)?;

        let mut options = self.options.unwrap_or_default();
        if let Some(dir) = self.output_dir {
            options.dir = dir;
        }
        if let Some(dry_run) = self.dry_run {
            options.dry_run = dry_run;
        }
        if let Some(ignore) = self.ignore_invalid_paths {
            options.ignore_invalid_paths = ignore;
        }

        let mut job = Extraction::new(options);
        if let Some(cancel) = self.cancel {
            job = job.with_cancellation(cancel);
        }
        Ok((archive_path, job))
    }
}
