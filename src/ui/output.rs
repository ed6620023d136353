use crate::error::{RecordSplitError, UserFriendlyError};
use crate::extractor::{ExtractionSummary, RunReport};
use console::{style, Emoji, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &RecordSplitError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    // Summary and reporting
    pub fn print_extraction_summary(&self, summary: &ExtractionSummary) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(summary),
            OutputMode::Json => self.print_json_summary(summary),
            OutputMode::Plain => self.print_plain_summary(summary),
        }
    }

    pub fn print_run_report(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_report(report);
                }
            }
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => {
                if !self.quiet {
                    self.print_plain_report(report);
                }
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: String) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value
        }
    }

    fn print_human_summary(&self, summary: &ExtractionSummary) {
        println!();
        self.print_separator();

        if self.use_colors {
            println!("{} {}", style("Record extraction completed!").green().bold(), CHECKMARK);
        } else {
            println!("✓ Record extraction completed!");
        }

        println!();
        println!("  Records written: {}", self.highlight(summary.written.to_string()));
        println!("  Records skipped: {}", self.highlight(summary.skipped.to_string()));
        println!("  Bytes written:   {}", self.highlight(format_bytes(summary.bytes_written)));
        println!("  Time taken:      {}", self.highlight(format_duration(summary.elapsed())));

        if summary.write_failures > 0 {
            println!("  Write failures:  {}", summary.write_failures);
        }

        self.print_separator();
    }

    fn print_json_summary(&self, summary: &ExtractionSummary) {
        let (skipped, written) = summary.counts();
        self.print_json_object(&serde_json::json!({
            "type": "summary",
            "written": written,
            "skipped": skipped,
            "write_failures": summary.write_failures,
            "bytes_written": summary.bytes_written,
            "duration_ms": summary.elapsed().as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_plain_summary(&self, summary: &ExtractionSummary) {
        let (skipped, written) = summary.counts();
        println!("COMPLETED: Record extraction");
        println!("Done: {} skipped, {} written", skipped, written);
        println!("Bytes written: {}", summary.bytes_written);
        println!("Duration: {:?}", summary.elapsed());
        if summary.write_failures > 0 {
            println!("Write failures: {}", summary.write_failures);
        }
    }

    fn print_human_report(&self, report: &RunReport) {
        let title = if report.dry_run {
            "Dry Run Plan"
        } else {
            "Extraction Report"
        };
        self.print_header(title);

        println!("Source: {}", report.source);
        println!("Output directory: {}", report.output_directory);
        println!(
            "Extracted at: {}",
            report.extraction_time.format("%Y-%m-%d %H:%M UTC")
        );
        println!();

        if !report.files.is_empty() {
            println!(
                "{}",
                if report.dry_run {
                    "Files that would be written:"
                } else {
                    "Files written:"
                }
            );
            for file in &report.files {
                println!("  {}", file);
            }
            println!();
        }

        if !report.skipped.is_empty() {
            println!("Skipped records:");
            for skipped in &report.skipped {
                println!("  - {}", skipped.reason);
            }
            println!();
        }

        if !report.failures.is_empty() {
            println!("Write failures:");
            for failure in &report.failures {
                println!("  - {}: {}", failure.name, failure.message);
            }
        }
    }

    fn print_plain_report(&self, report: &RunReport) {
        println!(
            "REPORT: {}",
            if report.dry_run {
                "Dry run completed"
            } else {
                "Extraction completed"
            }
        );
        println!("STATUS: {}", if report.has_issues() { "issues" } else { "clean" });
        println!("Source: {}", report.source);
        println!("Output: {}", report.output_directory);
        for file in &report.files {
            println!("FILE: {}", file);
        }
        for skipped in &report.skipped {
            println!("SKIPPED: {}", skipped.reason);
        }
        for failure in &report.failures {
            println!("FAILED: {}: {}", failure.name, failure.message);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_creation() {
        let formatter = OutputFormatter::new(OutputMode::Plain, 1, false);
        assert_eq!(formatter.mode, OutputMode::Plain);
        assert_eq!(formatter.verbose_level, 1);
        assert!(!formatter.use_colors);
    }

    #[test]
    fn test_quiet_mode() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert_eq!(formatter.verbose_level, 0);
        assert!(formatter.quiet);
        assert!(!formatter.use_colors);
    }

    #[test]
    fn test_should_show_message() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, false);
        assert!(formatter.should_show_message(0));
        assert!(formatter.should_show_message(2));
        assert!(!formatter.should_show_message(3));

        let quiet_formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert!(!quiet_formatter.should_show_message(0));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
    }
}
