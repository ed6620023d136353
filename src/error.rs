use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordSplitError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source file not found: {path}")]
    InputNotFound { path: String },

    #[error("No source file was selected")]
    NoSourceSelected,

    #[error("Source file is not valid UTF-8: {path} (invalid byte at offset {valid_up_to})")]
    Decode { path: String, valid_up_to: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Permission denied: {path}")]
    Permission { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Output file already exists: {path}")]
    OutputExists { path: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for RecordSplitError {
    fn user_message(&self) -> String {
        match self {
            RecordSplitError::InputNotFound { path } => {
                format!("Input file '{}' could not be found", path)
            }
            RecordSplitError::NoSourceSelected => {
                "No filename entered, nothing to process".to_string()
            }
            RecordSplitError::Decode { path, valid_up_to } => {
                format!(
                    "Could not read '{}' as text: invalid UTF-8 after {} bytes",
                    path,
                    format_bytes(*valid_up_to as u64)
                )
            }
            RecordSplitError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            RecordSplitError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            RecordSplitError::Cancelled => "Operation was cancelled by user".to_string(),
            RecordSplitError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            RecordSplitError::OutputExists { path } => {
                format!("Output file already exists: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        let hint = match self {
            RecordSplitError::InputNotFound { .. } => {
                "Put the file in the current folder, or pass its path as the first argument."
            }
            RecordSplitError::NoSourceSelected => {
                "Run again and type the name of the file to process (e.g., cookies.txt)."
            }
            RecordSplitError::Decode { .. } => {
                "Convert the file to UTF-8, or use --lossy to replace undecodable bytes."
            }
            RecordSplitError::Config { .. } => {
                "Check your configuration file syntax and the value of every field."
            }
            RecordSplitError::Permission { .. } => {
                "Ensure you have read/write permissions for the target directory."
            }
            RecordSplitError::OutputExists { .. } => {
                "Remove the file, pick another directory with --output, or drop --keep-existing."
            }
            _ => return None,
        };
        Some(hint.to_string())
    }
}

impl From<toml::de::Error> for RecordSplitError {
    fn from(error: toml::de::Error) -> Self {
        RecordSplitError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecordSplitError>;

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
