pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod source;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, InputConfig, NamingConfig, OutputConfig};
pub use error::{RecordSplitError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    DirectorySink, ExtractionOutcome, ExtractionSummary, MemorySink, NameRegistry, OutputManager,
    RecordExtractor, RecordSink, RunReport, SkipReason,
};
pub use source::{read_source, resolve_source, FixedPrompt, SourcePrompt, TerminalPrompt};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;
use tracing::info;

/// Application facade: configuration, console output and one extraction run.
pub struct RecordSplit {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl RecordSplit {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    /// Splits `source` into records under the configured output directory.
    ///
    /// With `dry_run` the records go to a [`MemorySink`] and nothing touches
    /// the disk; the report then lists the files that would be written.
    pub fn organize(&self, source: &Path, dry_run: bool) -> Result<RunReport> {
        self.output_formatter
            .start_operation(&format!("Reading {}", source.display()));
        let text = read_source(source, self.config.input.lossy_decoding)?;

        let output_manager = OutputManager::new(self.config.output.directory.clone());
        let extractor = RecordExtractor::from_config(&self.config.naming);

        let mut memory_sink = MemorySink::new();
        let mut directory_sink;
        let sink: &mut dyn RecordSink = if dry_run {
            self.output_formatter
                .info("DRY RUN MODE - No files will be written");
            &mut memory_sink
        } else {
            if output_manager.ensure_directory()? {
                self.output_formatter.success(&format!(
                    "Created output directory: {}",
                    output_manager.get_output_directory().display()
                ));
            }
            directory_sink = DirectorySink::new(output_manager.get_output_directory())
                .with_overwrite(self.config.output.overwrite);
            &mut directory_sink
        };

        self.output_formatter.start_operation("Splitting records");
        let record_progress = self.progress_manager.create_record_progress();
        let progress_callback = |summary: &ExtractionSummary| {
            ui::progress::update_record_progress(&record_progress, summary);
        };

        let outcome = extractor.extract(&text, NameRegistry::new(), sink, Some(&progress_callback));
        let summary = outcome.summary;

        ui::progress::finish_progress_with_summary(
            &record_progress,
            &format!("Wrote {} records", summary.written),
            summary.elapsed(),
        );

        let (skipped, written) = summary.counts();
        info!(skipped, written, failures = summary.write_failures, "extraction finished");

        let report = output_manager.create_run_report(source, &summary, dry_run);

        if self.config.output.generate_report && !dry_run {
            let report_path = output_manager.save_report_json(&report)?;
            self.output_formatter
                .info(&format!("Saved run report to {}", report_path.display()));
        }

        if summary.write_failures > 0 {
            self.output_formatter.warning(&format!(
                "{} records could not be written",
                summary.write_failures
            ));
        }

        self.output_formatter.print_extraction_summary(&summary);

        Ok(report)
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn handle_error(&self, error: &RecordSplitError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Splits `source` into `output_dir` with default settings and no console output.
pub fn split_records_simple(source: &Path, output_dir: &Path) -> Result<RunReport> {
    let mut config = Config::default();
    config.output.directory = output_dir.to_path_buf();

    RecordSplit::new(config, OutputMode::Plain, 0, true).organize(source, false)
}
