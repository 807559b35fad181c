//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use std::env;
use std::path;
use zipguard_core::ExtractOptions;
use zipguard_core::NoopHooks;
use zipguard_core::api::Extraction;

pub fn execute(
    args: &ExtractArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> Result<()> {
    let options = build_options(args)?;
    tracing::debug!(
        archive = %args.archive.display(),
        dest = %options.dir.display(),
        dry_run = options.dry_run,
        "starting extraction"
    );

    let job = Extraction::new(options);
    let result = if show_progress && CliProgress::should_show() {
        let mut progress = CliProgress::new("Extracting");
        job.run_zip(&args.archive, &mut progress)
    } else {
        job.run_zip(&args.archive, &mut NoopHooks)
    };
    let report = add_archive_context(result, &args.archive)?;

    formatter.format_extraction_result(&report)?;

    Ok(())
}

/// The core library only accepts absolute destinations; the CLI resolves a
/// relative one against the working directory.
fn build_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let dest = match &args.output_dir {
        Some(dir) => path::absolute(dir)
            .with_context(|| format!("failed to resolve destination {}", dir.display()))?,
        None => env::current_dir().context("failed to get current directory")?,
    };

    let mut options = ExtractOptions::new(dest)
        .with_dry_run(args.dry_run)
        .with_ignore_invalid_paths(args.ignore_invalid_paths);
    if let Some(mode) = args.default_dir_mode {
        options.default_dir_mode = mode;
    }
    if let Some(mode) = args.default_file_mode {
        options.default_file_mode = mode;
    }
    Ok(options)
}
