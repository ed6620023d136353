use crate::extractor::ExtractionSummary;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"];

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    /// Spinner for record extraction; the total is unknown up front.
    pub fn create_record_progress(&self) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {pos:>7} records {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
        );
        pb.set_message("Splitting records...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

pub fn update_record_progress(pb: &ProgressBar, summary: &ExtractionSummary) {
    pb.set_position((summary.written + summary.skipped + summary.write_failures) as u64);

    match summary.current_file {
        Some(ref current_file) if summary.skipped > 0 => {
            pb.set_message(format!("Writing {} ({} skipped)", current_file, summary.skipped));
        }
        Some(ref current_file) => pb.set_message(format!("Writing {}", current_file)),
        None => pb.set_message("Splitting records..."),
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
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
    use crate::extractor::SkipReason;

    #[test]
    fn test_disabled_progress_bars() {
        let manager = ProgressManager::new(false);
        assert!(manager.create_record_progress().is_hidden());
    }

    #[test]
    fn test_update_record_progress() {
        let pb = ProgressBar::hidden();
        let mut summary = ExtractionSummary::new();

        update_record_progress(&pb, &summary);
        assert_eq!(pb.position(), 0);
        assert_eq!(pb.message(), "Splitting records...");

        summary.record_written("a.txt".to_string(), 5);
        update_record_progress(&pb, &summary);
        assert_eq!(pb.position(), 1);
        assert_eq!(pb.message(), "Writing a.txt");

        summary.record_skipped(SkipReason::OrphanData { block: 3 });
        update_record_progress(&pb, &summary);
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.message(), "Writing a.txt (1 skipped)");
    }

    #[test]
    fn test_finish_progress_with_summary() {
        let pb = ProgressBar::hidden();
        finish_progress_with_summary(&pb, "Wrote 2 records", Duration::from_secs(3));
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "Wrote 2 records (completed in 3s)");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
    }
}
