use crate::config::NamingConfig;
use crate::error::Result;
use crate::extractor::blocks::{classify, split_blocks, BlockKind};
use crate::extractor::naming::{derive_name, NameRegistry};
use crate::extractor::pairing::{pair, PairEvent, SkipReason};
use crate::source::decode_source;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Receives one `(name, content)` pair per record and persists it.
pub trait RecordSink {
    /// Returns the number of bytes stored.
    fn write_record(&mut self, name: &str, content: &str) -> Result<u64>;
}

/// Keeps every record in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<(String, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|(stored, _)| stored == name)
            .map(|(_, content)| content.as_str())
    }
}

impl RecordSink for MemorySink {
    fn write_record(&mut self, name: &str, content: &str) -> Result<u64> {
        self.records.push((name.to_string(), content.to_string()));
        Ok(content.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    pub written: usize,
    pub skipped: usize,
    pub write_failures: usize,
    pub bytes_written: u64,
    pub written_files: Vec<String>,
    pub skips: Vec<SkipReason>,
    pub failures: Vec<WriteFailure>,
    pub current_file: Option<String>,
    pub start_time: Instant,
}

impl ExtractionSummary {
    pub fn new() -> Self {
        Self {
            written: 0,
            skipped: 0,
            write_failures: 0,
            bytes_written: 0,
            written_files: Vec::new(),
            skips: Vec::new(),
            failures: Vec::new(),
            current_file: None,
            start_time: Instant::now(),
        }
    }

    pub fn record_written(&mut self, name: String, bytes: u64) {
        self.written += 1;
        self.bytes_written += bytes;
        self.current_file = Some(name.clone());
        self.written_files.push(name);
    }

    pub fn record_skipped(&mut self, reason: SkipReason) {
        self.skipped += 1;
        self.skips.push(reason);
    }

    pub fn record_failure(&mut self, name: String, message: String) {
        self.write_failures += 1;
        self.failures.push(WriteFailure { name, message });
    }

    /// `(skipped, written)` counts.
    pub fn counts(&self) -> (usize, usize) {
        (self.skipped, self.written)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for ExtractionSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one extraction: the summary plus the names now in use.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub summary: ExtractionSummary,
    pub names: NameRegistry,
}

/// Turns a delimited record dump into named records.
pub struct RecordExtractor {
    max_name_length: usize,
    fallback_stem: String,
    append_extension: Option<String>,
}

impl RecordExtractor {
    pub fn new() -> Self {
        Self::from_config(&NamingConfig::default())
    }

    pub fn from_config(config: &NamingConfig) -> Self {
        Self {
            max_name_length: config.max_length,
            fallback_stem: config.fallback_stem.clone(),
            append_extension: config.extension(),
        }
    }

    /// Splits `text` into records and hands each one to `sink`.
    ///
    /// Malformed records and sink failures are counted in the summary; this
    /// never fails. `names` carries names already used in the run.
    pub fn extract(
        &self,
        text: &str,
        names: NameRegistry,
        sink: &mut dyn RecordSink,
        progress_callback: Option<&dyn Fn(&ExtractionSummary)>,
    ) -> ExtractionOutcome {
        let mut names = names;
        let mut summary = ExtractionSummary::new();

        let classified = split_blocks(text).map(|block| {
            let classified = classify(block);
            let is_header = matches!(classified.kind, BlockKind::Header { .. });
            debug!(block = classified.number, is_header, "classified block");
            classified
        });

        for event in pair(classified) {
            match event {
                PairEvent::Skipped(reason) => {
                    warn!(block = reason.block(), "skipping record: {}", reason);
                    summary.record_skipped(reason);
                }
                PairEvent::Record(record) => {
                    let derived = derive_name(
                        &record.name,
                        record.header_block,
                        self.max_name_length,
                        &self.fallback_stem,
                        self.append_extension.as_deref(),
                    );
                    let final_name = names.claim(&derived, self.max_name_length);

                    match sink.write_record(&final_name, record.content) {
                        Ok(bytes) => {
                            debug!(
                                header = record.header_block,
                                payload = record.payload_block,
                                file = %final_name,
                                bytes,
                                "record written"
                            );
                            summary.record_written(final_name, bytes);
                        }
                        Err(e) => {
                            warn!(file = %final_name, error = %e, "failed to write record");
                            summary.record_failure(final_name, e.to_string());
                        }
                    }
                }
            }

            if let Some(callback) = progress_callback {
                callback(&summary);
            }
        }

        ExtractionOutcome { summary, names }
    }

    /// Decodes `bytes` the same way source files are decoded (strict UTF-8,
    /// leading BOM dropped) and extracts from the result.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        names: NameRegistry,
        sink: &mut dyn RecordSink,
    ) -> Result<ExtractionOutcome> {
        let text = decode_source(bytes.to_vec(), Path::new("<input>"), false)?;
        Ok(self.extract(&text, names, sink, None))
    }
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordSplitError;
    use crate::extractor::blocks::BLOCK_SEPARATOR;
    use crate::extractor::naming::DEFAULT_MAX_NAME_LENGTH;
    use crate::extractor::DirectorySink;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn join_blocks(blocks: &[&str]) -> String {
        blocks.join(&format!("\n{}\n", BLOCK_SEPARATOR))
    }

    fn run(text: &str) -> (MemorySink, ExtractionSummary) {
        let mut sink = MemorySink::new();
        let outcome = RecordExtractor::new().extract(text, NameRegistry::new(), &mut sink, None);
        (sink, outcome.summary)
    }

    struct FailingSink {
        fail_on: &'static str,
        inner: MemorySink,
    }

    impl RecordSink for FailingSink {
        fn write_record(&mut self, name: &str, content: &str) -> Result<u64> {
            if name == self.fail_on {
                return Err(RecordSplitError::Permission {
                    path: name.to_string(),
                });
            }
            self.inner.write_record(name, content)
        }
    }

    #[test]
    fn test_duplicate_names_are_disambiguated() {
        let text = join_blocks(&["Parsing Info: a.txt", "hello", "Parsing Info: a.txt", "world"]);
        let (sink, summary) = run(&text);

        assert_eq!(sink.names(), vec!["a.txt", "a_1.txt"]);
        assert_eq!(sink.get("a.txt"), Some("hello"));
        assert_eq!(sink.get("a_1.txt"), Some("world"));
        assert_eq!(summary.counts(), (0, 2));
    }

    #[test]
    fn test_header_followed_by_header_is_counted() {
        let text = join_blocks(&["Parsing Info: first", "Parsing Info: second", "payload"]);
        let (sink, summary) = run(&text);

        assert_eq!(sink.names(), vec!["second"]);
        assert_eq!(summary.skipped, 1);
        assert!(matches!(summary.skips[0], SkipReason::UnmatchedHeader { block: 1, .. }));
    }

    #[test]
    fn test_empty_input() {
        let (sink, summary) = run("");
        assert!(sink.records.is_empty());
        assert_eq!(summary.counts(), (0, 0));
        assert_eq!(summary.write_failures, 0);
    }

    #[test]
    fn test_multiline_header_and_payload() {
        let text = join_blocks(&[
            "URL: https://example.com\nParsing Info: example.com cookies\nCount: 3",
            ".example.com\tTRUE\t/\tFALSE\t0\tsid\tabc\n.example.com\tTRUE\t/\tFALSE\t0\tuid\tdef",
        ]);
        let (sink, summary) = run(&text);

        assert_eq!(summary.written, 1);
        let content = sink.get("example.com cookies").unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_orphans_and_trailing_headers_never_written() {
        let text = join_blocks(&[
            "orphan",
            "Parsing Info: kept",
            "data",
            "extra data",
            "Parsing Info: dangling",
        ]);
        let (sink, summary) = run(&text);

        assert_eq!(sink.names(), vec!["kept"]);
        assert_eq!(summary.counts(), (3, 1));
        let blocks: Vec<usize> = summary.skips.iter().map(SkipReason::block).collect();
        assert_eq!(blocks, vec![1, 4, 5]);
    }

    #[test]
    fn test_unsanitizable_name_uses_fallback() {
        let text = join_blocks(&["Parsing Info: ...", "content"]);
        let (sink, _) = run(&text);
        assert_eq!(sink.names(), vec!["record_1"]);
    }

    #[test]
    fn test_append_extension() {
        let text = join_blocks(&["Parsing Info: site", "x", "Parsing Info: other.txt", "y"]);
        let naming = NamingConfig {
            append_extension: ".txt".to_string(),
            ..NamingConfig::default()
        };
        let mut sink = MemorySink::new();
        RecordExtractor::from_config(&naming).extract(&text, NameRegistry::new(), &mut sink, None);
        assert_eq!(sink.names(), vec!["site.txt", "other.txt"]);
    }

    #[test]
    fn test_registry_is_carried_between_runs() {
        let text = join_blocks(&["Parsing Info: a.txt", "one"]);
        let extractor = RecordExtractor::new();
        let mut sink = MemorySink::new();

        let first = extractor.extract(&text, NameRegistry::new(), &mut sink, None);
        let second = extractor.extract(&text, first.names, &mut sink, None);

        assert_eq!(sink.names(), vec!["a.txt", "a_1.txt"]);
        assert_eq!(second.names.len(), 2);

        let fresh = extractor.extract(&text, NameRegistry::new(), &mut MemorySink::new(), None);
        assert_eq!(fresh.summary.written_files, vec!["a.txt"]);
    }

    #[test]
    fn test_write_failures_do_not_stop_the_run() {
        let text = join_blocks(&["Parsing Info: bad", "x", "Parsing Info: good", "y"]);
        let mut sink = FailingSink {
            fail_on: "bad",
            inner: MemorySink::new(),
        };
        let outcome = RecordExtractor::new().extract(&text, NameRegistry::new(), &mut sink, None);

        assert_eq!(sink.inner.names(), vec!["good"]);
        assert_eq!(outcome.summary.written, 1);
        assert_eq!(outcome.summary.write_failures, 1);
        assert_eq!(outcome.summary.skipped, 0);
        assert_eq!(outcome.summary.failures[0].name, "bad");
    }

    #[test]
    fn test_progress_callback_sees_every_event() {
        let text = join_blocks(&["orphan", "Parsing Info: a", "x"]);
        let calls = Cell::new(0);
        let callback = |_: &ExtractionSummary| calls.set(calls.get() + 1);

        RecordExtractor::new().extract(
            &text,
            NameRegistry::new(),
            &mut MemorySink::new(),
            Some(&callback),
        );
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_extract_bytes_rejects_invalid_utf8() {
        let mut sink = MemorySink::new();
        let result =
            RecordExtractor::new().extract_bytes(b"ok\xff\xfe", NameRegistry::new(), &mut sink);
        assert!(matches!(result, Err(RecordSplitError::Decode { valid_up_to: 2, .. })));

        let outcome = RecordExtractor::new()
            .extract_bytes(b"", NameRegistry::new(), &mut sink)
            .unwrap();
        assert_eq!(outcome.summary.counts(), (0, 0));
    }

    #[test]
    fn test_extract_bytes_strips_bom() {
        let text = format!("\u{feff}{}", join_blocks(&["Parsing Info: a.txt", "hello"]));
        let mut sink = MemorySink::new();

        let outcome = RecordExtractor::new()
            .extract_bytes(text.as_bytes(), NameRegistry::new(), &mut sink)
            .unwrap();

        assert_eq!(outcome.summary.counts(), (0, 1));
        assert_eq!(sink.get("a.txt"), Some("hello"));
    }

    #[test]
    fn test_long_names_fit_on_disk_with_extension() {
        let dest_dir = TempDir::new().unwrap();
        let long = format!("Parsing Info: {}", "a".repeat(300));
        let text = join_blocks(&[long.as_str(), "one", long.as_str(), "two"]);

        let naming = NamingConfig {
            max_length: 255,
            append_extension: "txt".to_string(),
            ..NamingConfig::default()
        };
        let mut sink = DirectorySink::new(dest_dir.path());
        let extractor = RecordExtractor::from_config(&naming);
        let outcome = extractor.extract(&text, NameRegistry::new(), &mut sink, None);

        assert_eq!(outcome.summary.write_failures, 0);
        assert_eq!(outcome.summary.written, 2);
        for name in &outcome.summary.written_files {
            assert!(name.len() <= 255, "{} bytes", name.len());
            assert!(name.ends_with(".txt"));
            assert!(dest_dir.path().join(name).is_file());
        }
    }

    #[test]
    fn test_collision_suffix_stays_within_default_length() {
        let long = format!("Parsing Info: {}", "b".repeat(300));
        let text = join_blocks(&[
            long.as_str(),
            "one",
            long.as_str(),
            "two",
            long.as_str(),
            "three",
        ]);
        let (sink, summary) = run(&text);

        assert_eq!(summary.written, 3);
        for name in sink.names() {
            assert!(name.len() <= DEFAULT_MAX_NAME_LENGTH);
        }
    }
}
