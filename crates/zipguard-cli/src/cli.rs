//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;
use zipguard_core::config::parse_mode;

#[derive(Parser)]
#[command(name = "zipguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a ZIP archive without writing outside the destination
    Extract(ExtractArgs),
    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the ZIP archive
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Destination directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Check every entry but write nothing
    #[arg(long, env = "ZIPGUARD_DRY_RUN")]
    pub dry_run: bool,

    /// Skip entries with invalid or escaping paths instead of failing
    #[arg(long, env = "ZIPGUARD_IGNORE_INVALID_PATHS")]
    pub ignore_invalid_paths: bool,

    /// Octal mode for directories without recorded permissions
    #[arg(long, value_name = "MODE", env = "ZIPGUARD_DEFAULT_DIR_MODE", value_parser = parse_dir_mode)]
    pub default_dir_mode: Option<u32>,

    /// Octal mode for files without recorded permissions
    #[arg(long, value_name = "MODE", env = "ZIPGUARD_DEFAULT_FILE_MODE", value_parser = parse_file_mode)]
    pub default_file_mode: Option<u32>,
}

fn parse_dir_mode(s: &str) -> Result<u32, String> {
    parse_mode("default-dir-mode", s).map_err(|e| e.to_string())
}

fn parse_file_mode(s: &str) -> Result<u32, String> {
    parse_mode("default-file-mode", s).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(parse_dir_mode("0750").unwrap(), 0o750);
        assert_eq!(parse_file_mode("600").unwrap(), 0o600);
        assert!(parse_file_mode("0999").is_err());
        assert!(parse_dir_mode("").is_err());
    }

    #[test]
    fn test_extract_args() {
        let cli = Cli::try_parse_from([
            "zipguard",
            "extract",
            "a.zip",
            "/tmp/out",
            "--dry-run",
            "--default-file-mode",
            "0640",
        ])
        .unwrap();

        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.archive, PathBuf::from("a.zip"));
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
        assert!(args.dry_run);
        assert!(!args.ignore_invalid_paths);
        assert_eq!(args.default_file_mode, Some(0o640));
        assert_eq!(args.default_dir_mode, None);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["zipguard", "-q", "-v", "extract", "a.zip"]);
        assert!(result.is_err());
    }
}
