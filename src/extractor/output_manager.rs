use crate::error::{RecordSplitError, Result};
use crate::extractor::pairing::SkipReason;
use crate::extractor::{ExtractionSummary, WriteFailure};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

const METADATA_DIR: &str = ".recordsplit";

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: String,
    pub output_directory: String,
    pub extraction_time: DateTime<Utc>,
    pub records_written: usize,
    pub records_skipped: usize,
    pub write_failures: usize,
    pub bytes_written: u64,
    pub duration: Duration,
    pub files: Vec<String>,
    pub skipped: Vec<SkippedRecord>,
    pub failures: Vec<WriteFailure>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub reason: String,
    #[serde(flatten)]
    pub detail: SkipReason,
}

impl From<&SkipReason> for SkippedRecord {
    fn from(reason: &SkipReason) -> Self {
        Self {
            reason: reason.to_string(),
            detail: reason.clone(),
        }
    }
}

impl SkippedRecord {
    pub fn block(&self) -> usize {
        self.detail.block()
    }
}

impl RunReport {
    pub fn has_issues(&self) -> bool {
        self.records_skipped > 0 || self.write_failures > 0
    }

    /// `(skipped, written)` counts.
    pub fn counts(&self) -> (usize, usize) {
        (self.records_skipped, self.records_written)
    }
}

pub struct OutputManager {
    output_directory: PathBuf,
}

impl OutputManager {
    pub fn new<P: Into<PathBuf>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.into(),
        }
    }

    /// Creates the output directory if needed and checks it is writable.
    /// Calling it again on an existing directory is a no-op.
    pub fn ensure_directory(&self) -> Result<bool> {
        let created = !self.output_directory.exists();

        if self.output_directory.exists() && !self.output_directory.is_dir() {
            return Err(RecordSplitError::InvalidPath {
                path: format!(
                    "Output path exists and is not a directory: {}",
                    self.output_directory.display()
                ),
            });
        }

        fs::create_dir_all(&self.output_directory).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => RecordSplitError::Permission {
                path: format!(
                    "Cannot create output directory {}: {}",
                    self.output_directory.display(),
                    e
                ),
            },
            _ => RecordSplitError::Io(e),
        })?;

        self.validate_writable()?;
        Ok(created)
    }

    pub fn get_output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn get_metadata_dir(&self) -> PathBuf {
        self.output_directory.join(METADATA_DIR)
    }

    pub fn create_run_report(
        &self,
        source: &Path,
        summary: &ExtractionSummary,
        dry_run: bool,
    ) -> RunReport {
        RunReport {
            source: source.display().to_string(),
            output_directory: self.output_directory.display().to_string(),
            extraction_time: Utc::now(),
            records_written: summary.written,
            records_skipped: summary.skipped,
            write_failures: summary.write_failures,
            bytes_written: summary.bytes_written,
            duration: summary.elapsed(),
            files: summary.written_files.clone(),
            skipped: summary.skips.iter().map(SkippedRecord::from).collect(),
            failures: summary.failures.clone(),
            dry_run,
        }
    }

    /// Writes `report` to `.recordsplit/run_report.json` and returns its path.
    pub fn save_report_json(&self, report: &RunReport) -> Result<PathBuf> {
        let metadata_dir = self.get_metadata_dir();
        fs::create_dir_all(&metadata_dir).map_err(RecordSplitError::Io)?;

        let report_path = metadata_dir.join("run_report.json");
        let json_content =
            serde_json::to_string_pretty(report).map_err(|e| RecordSplitError::Config {
                message: format!("Failed to serialize report to JSON: {}", e),
            })?;

        fs::write(&report_path, json_content).map_err(RecordSplitError::Io)?;

        Ok(report_path)
    }

    fn validate_writable(&self) -> Result<()> {
        let test_file = self.output_directory.join(".recordsplit_write_test");
        match fs::File::create(&test_file) {
            Ok(_) => {
                let _ = fs::remove_file(&test_file); // Clean up test file
                Ok(())
            }
            Err(e) => Err(RecordSplitError::Permission {
                path: format!(
                    "No write permission for directory {}: {}",
                    self.output_directory.display(),
                    e
                ),
            }),
        }
    }
}
