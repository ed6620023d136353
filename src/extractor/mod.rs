pub mod blocks;
pub mod file_writer;
pub mod naming;
pub mod output_manager;
pub mod pairing;
pub mod record_extractor;

pub use blocks::{split_blocks, Block, BlockKind, Blocks, BLOCK_SEPARATOR, PARSING_INFO_MARKER};
pub use file_writer::DirectorySink;
pub use naming::{sanitize_filename, NameRegistry};
pub use output_manager::{OutputManager, RunReport, SkippedRecord};
pub use pairing::{pair, PairEvent, Record, SkipReason};
pub use record_extractor::{
    ExtractionOutcome, ExtractionSummary, MemorySink, RecordExtractor, RecordSink, WriteFailure,
};
