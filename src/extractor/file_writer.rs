use crate::error::{RecordSplitError, Result};
use crate::extractor::RecordSink;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Writes each record to `<directory>/<name>`.
///
/// Content goes to a temporary file in the same directory and is renamed
/// into place; a failed write leaves no partial file behind.
pub struct DirectorySink {
    directory: PathBuf,
    overwrite: bool,
}

impl DirectorySink {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            overwrite: true,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Persists one record and returns the number of bytes written.
    pub fn write_file(&self, name: &str, content: &str) -> Result<u64> {
        let dest = self.directory.join(name);
        self.validate_destination_path(name, &dest)?;

        if dest.exists() && !self.overwrite {
            return Err(RecordSplitError::OutputExists {
                path: dest.display().to_string(),
            });
        }

        let temp = NamedTempFile::new_in(&self.directory).map_err(|e| map_io_error(e, &dest))?;
        {
            let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, temp.as_file());
            writer
                .write_all(content.as_bytes())
                .map_err(|e| map_io_error(e, &dest))?;
            writer.flush().map_err(|e| map_io_error(e, &dest))?;
        }

        let persisted = if self.overwrite {
            temp.persist(&dest)
        } else {
            temp.persist_noclobber(&dest)
        };
        persisted.map_err(|e| map_io_error(e.error, &dest))?;

        Ok(content.len() as u64)
    }

    fn validate_destination_path(&self, name: &str, path: &Path) -> Result<()> {
        // Security: plain filenames only, no separators or traversal
        let mut components = Path::new(name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal || name.contains(['/', '\\']) {
            return Err(RecordSplitError::InvalidPath {
                path: format!("Record name must be a plain filename: {}", name),
            });
        }

        check_path_length(path)
    }
}

impl RecordSink for DirectorySink {
    fn write_record(&mut self, name: &str, content: &str) -> Result<u64> {
        self.write_file(name, content)
    }
}

fn map_io_error(error: std::io::Error, path: &Path) -> RecordSplitError {
    match error.kind() {
        ErrorKind::PermissionDenied => RecordSplitError::Permission {
            path: path.display().to_string(),
        },
        ErrorKind::AlreadyExists => RecordSplitError::OutputExists {
            path: path.display().to_string(),
        },
        _ => RecordSplitError::Io(error),
    }
}

// Check if path exceeds platform limits
pub fn check_path_length(path: &Path) -> Result<()> {
    let path_str = path.to_string_lossy();

    #[cfg(windows)]
    const MAX_PATH: usize = 260;

    #[cfg(not(windows))]
    const MAX_PATH: usize = 4096;

    if path_str.len() > MAX_PATH {
        Err(RecordSplitError::InvalidPath {
            path: format!("Path too long: {} characters (max: {})", path_str.len(), MAX_PATH),
        })
    } else {
        Ok(())
    }
}
