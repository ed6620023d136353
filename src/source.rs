use crate::error::{RecordSplitError, Result};
use console::Term;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const UTF8_BOM: &str = "\u{feff}";

/// Asks someone for a source path when the default file is missing.
pub trait SourcePrompt {
    /// `Ok(None)` means the operator gave no answer.
    fn ask_for_source(&mut self, missing: &Path) -> Result<Option<PathBuf>>;
}

/// Reads the answer from the terminal.
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl SourcePrompt for TerminalPrompt {
    fn ask_for_source(&mut self, missing: &Path) -> Result<Option<PathBuf>> {
        self.term
            .write_line(&format!("Default file '{}' not found.", missing.display()))?;
        self.term
            .write_str("Please enter the name of the file to process (e.g., cookies.txt): ")?;

        let answer = match self.term.read_line() {
            Ok(answer) => answer,
            Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::UnexpectedEof) => {
                return Err(RecordSplitError::Cancelled);
            }
            Err(e) => return Err(RecordSplitError::Io(e)),
        };

        let answer = answer.trim();
        Ok(if answer.is_empty() {
            None
        } else {
            Some(PathBuf::from(answer))
        })
    }
}

/// Returns a preset answer; for non-interactive runs.
#[derive(Debug, Clone, Default)]
pub struct FixedPrompt {
    answer: Option<PathBuf>,
    asked: usize,
}

impl FixedPrompt {
    pub fn new<P: Into<PathBuf>>(answer: Option<P>) -> Self {
        Self {
            answer: answer.map(Into::into),
            asked: 0,
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked
    }
}

impl SourcePrompt for FixedPrompt {
    fn ask_for_source(&mut self, _missing: &Path) -> Result<Option<PathBuf>> {
        self.asked += 1;
        Ok(self.answer.clone())
    }
}

/// Picks the file to process: the explicit path, else the default file,
/// else whatever `prompt` answers.
pub fn resolve_source(
    explicit: Option<&Path>,
    default_source: &Path,
    prompt: &mut dyn SourcePrompt,
) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None if default_source.exists() => default_source.to_path_buf(),
        None => {
            info!(
                default = %default_source.display(),
                "default source not found, asking for another"
            );
            prompt
                .ask_for_source(default_source)?
                .ok_or(RecordSplitError::NoSourceSelected)?
        }
    };

    if !candidate.is_file() {
        return Err(RecordSplitError::InputNotFound {
            path: candidate.display().to_string(),
        });
    }

    Ok(candidate)
}

/// Reads and decodes the source file.
pub fn read_source(path: &Path, lossy: bool) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RecordSplitError::InputNotFound {
            path: path.display().to_string(),
        },
        ErrorKind::PermissionDenied => RecordSplitError::Permission {
            path: path.display().to_string(),
        },
        _ => RecordSplitError::Io(e),
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "read source file");
    decode_source(bytes, path, lossy)
}

/// UTF-8 decoding with an optional lossy mode. A leading BOM is dropped.
pub fn decode_source(bytes: Vec<u8>, path: &Path, lossy: bool) -> Result<String> {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) if lossy => {
            let valid_up_to = e.utf8_error().valid_up_to();
            tracing::warn!(
                path = %path.display(),
                valid_up_to,
                "replacing invalid UTF-8 in source"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
        Err(e) => {
            return Err(RecordSplitError::Decode {
                path: path.display().to_string(),
                valid_up_to: e.utf8_error().valid_up_to(),
            });
        }
    };

    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}
