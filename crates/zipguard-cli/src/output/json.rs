//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use zipguard_core::ExtractionReport;

pub struct JsonFormatter;

#[derive(Serialize)]
struct ExtractionOutput<'a> {
    files_extracted: usize,
    directories_created: usize,
    symlinks_created: usize,
    bytes_written: u64,
    entries_skipped: usize,
    errors_ignored: usize,
    dry_run: bool,
    duration_ms: u128,
    warnings: &'a [String],
}

impl<'a> From<&'a ExtractionReport> for ExtractionOutput<'a> {
    fn from(report: &'a ExtractionReport) -> Self {
        Self {
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            symlinks_created: report.symlinks_created,
            bytes_written: report.bytes_written,
            entries_skipped: report.entries_skipped,
            errors_ignored: report.errors_ignored,
            dry_run: report.dry_run,
            duration_ms: report.duration.as_millis(),
            warnings: &report.warnings,
        }
    }
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        let output = JsonOutput::success("extract", ExtractionOutput::from(report));
        Self::output(&output)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_output_fields() {
        let mut report = ExtractionReport::new();
        report.files_extracted = 3;
        report.errors_ignored = 1;
        report.add_warning("skipped ../evil".to_string());

        let output = JsonOutput::success("extract", ExtractionOutput::from(&report));
        let value: serde_json::Value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["operation"], "extract");
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["files_extracted"], 3);
        assert_eq!(value["data"]["errors_ignored"], 1);
        assert_eq!(value["data"]["dry_run"], false);
        assert_eq!(value["data"]["warnings"][0], "skipped ../evil");
    }
}
