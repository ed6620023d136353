use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recordsplit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Split a delimited record dump into one file per record")]
#[command(
    long_about = "recordsplit reads a text file made of blocks separated by a line of 27 dashes, \
                  pairs every 'Parsing Info: <name>' header with the block that follows it and \
                  writes each record to its own file in the output directory."
)]
#[command(before_help = "🍪 recordsplit - Record Extraction Tool")]
#[command(after_help = "EXAMPLES:\n  \
    recordsplit\n  \
    recordsplit cookies.txt --output organized\n  \
    recordsplit dump.txt --extension txt --report -vv\n  \
    recordsplit dump.txt --dry-run --output-format json\n  \
    recordsplit --generate-config --config recordsplit.toml")]
pub struct Cli {
    /// Source file (defaults to the configured default source, valide.txt)
    pub source: Option<PathBuf>,

    /// Output directory (defaults to Organized_Cookies)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Extension appended to every derived file name
    #[arg(short, long, help = "Extension to append to record names (e.g., txt)")]
    pub extension: Option<String>,

    /// Maximum length of a derived file name in bytes
    #[arg(long, help = "Maximum record name length in bytes (8-255)")]
    pub max_name_length: Option<usize>,

    /// Keep files that already exist in the output directory
    #[arg(long, help = "Do not overwrite files already present on disk")]
    pub keep_existing: bool,

    /// Save a JSON run report next to the records
    #[arg(long, help = "Write .recordsplit/run_report.json in the output directory")]
    pub report: bool,

    /// Replace invalid UTF-8 instead of failing
    #[arg(long, help = "Decode the source lossily, replacing invalid UTF-8")]
    pub lossy: bool,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be written without writing)
    #[arg(long, help = "List the records that would be written without writing them")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_output_dir(self.output.clone())
            .with_extension(self.extension.clone())
            .with_max_name_length(self.max_name_length)
            .with_overwrite(self.keep_existing.then_some(false))
            .with_generate_report(self.report.then_some(true))
            .with_lossy_decoding(self.lossy.then_some(true))
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Default `tracing` filter for this verbosity when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "off";
        }
        match self.verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("recordsplit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert!(cli.source.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.dry_run);
        assert!(matches!(cli.output_format, OutputFormat::Human));
        assert_eq!(cli.verbosity_level(), 0);
    }

    #[test]
    fn test_source_and_flags() {
        let cli = parse(&[
            "cookies.txt",
            "--output",
            "organized",
            "-e",
            "txt",
            "--max-name-length",
            "64",
            "--keep-existing",
            "--report",
            "--lossy",
        ]);

        assert_eq!(cli.source, Some(PathBuf::from("cookies.txt")));

        let overrides = cli.create_cli_overrides();
        assert_eq!(overrides.output_dir, Some(PathBuf::from("organized")));
        assert_eq!(overrides.extension.as_deref(), Some("txt"));
        assert_eq!(overrides.max_name_length, Some(64));
        assert_eq!(overrides.overwrite, Some(false));
        assert_eq!(overrides.generate_report, Some(true));
        assert_eq!(overrides.lossy_decoding, Some(true));
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let overrides = parse(&[]).create_cli_overrides();
        assert!(overrides.overwrite.is_none());
        assert!(overrides.generate_report.is_none());
        assert!(overrides.lossy_decoding.is_none());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["recordsplit", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(parse(&["-q"]).log_filter(), "off");
        assert_eq!(parse(&[]).log_filter(), "error");
        assert_eq!(parse(&["-v"]).log_filter(), "warn");
        assert_eq!(parse(&["-vv"]).log_filter(), "info");
        assert_eq!(parse(&["-vvv"]).log_filter(), "debug");
        assert_eq!(parse(&["-vv"]).verbosity_level(), 2);
    }

    #[test]
    fn test_invalid_name_length_fails_validation() {
        let cli = parse(&["--max-name-length", "2", "--config", "does-not-exist.toml"]);
        assert!(cli.load_config().is_err());

        let cli = parse(&["--max-name-length", "2"]);
        let mut config = Config::default();
        config.merge_with_cli_args(&cli.create_cli_overrides());
        assert!(config.validate().is_err());
    }
}
