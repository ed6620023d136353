use clap::Parser;
use recordsplit::{
    resolve_source, Cli, OutputFormatter, OutputMode, RecordSplit, RecordSplitError,
    TerminalPrompt, UserFriendlyError,
};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(&cli);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let app = match RecordSplit::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let mut prompt = TerminalPrompt::new();
    let source = match resolve_source(
        cli.source.as_deref(),
        &app.config().input.default_source,
        &mut prompt,
    ) {
        Ok(source) => source,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    match app.organize(&source, cli.dry_run) {
        Ok(report) => {
            app.output_formatter().print_run_report(&report);
            // Skipped records and write failures are reported, not fatal
            0
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &RecordSplitError) -> i32 {
    match error {
        RecordSplitError::Cancelled => 130, // Interrupted (SIGINT)
        RecordSplitError::InputNotFound { .. } | RecordSplitError::NoSourceSelected => 3,
        RecordSplitError::Decode { .. } => 4,
        RecordSplitError::Permission { .. } => 7,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "recordsplit.toml".to_string());

    match RecordSplit::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  recordsplit <source-file> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &RecordSplitError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recordsplit={}", cli.log_filter())));

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::parse_from([
            "recordsplit",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ]);

        assert_eq!(handle_generate_config(&cli), 0);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[naming]"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&RecordSplitError::Cancelled), 130);
        assert_eq!(exit_code_for(&RecordSplitError::NoSourceSelected), 3);
        assert_eq!(
            exit_code_for(&RecordSplitError::InputNotFound {
                path: "valide.txt".to_string()
            }),
            3
        );
        assert_eq!(
            exit_code_for(&RecordSplitError::Decode {
                path: "valide.txt".to_string(),
                valid_up_to: 0
            }),
            4
        );
        assert_eq!(
            exit_code_for(&RecordSplitError::Permission {
                path: "out".to_string()
            }),
            7
        );
        assert_eq!(
            exit_code_for(&RecordSplitError::Config {
                message: "bad".to_string()
            }),
            1
        );
    }
}
