use crate::error::{RecordSplitError, Result};
use crate::extractor::naming::{sanitize_filename, DEFAULT_FALLBACK_STEM, DEFAULT_MAX_NAME_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_FILE: &str = "valide.txt";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "Organized_Cookies";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub naming: NamingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub default_source: PathBuf,
    pub lossy_decoding: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingConfig {
    pub max_length: usize,
    pub fallback_stem: String,
    pub append_extension: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub overwrite: bool,
    pub generate_report: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_source: PathBuf::from(DEFAULT_SOURCE_FILE),
            lossy_decoding: false,
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_NAME_LENGTH,
            fallback_stem: DEFAULT_FALLBACK_STEM.to_string(),
            append_extension: String::new(),
        }
    }
}

impl NamingConfig {
    /// Extension to append to derived names, without its leading dot.
    pub fn extension(&self) -> Option<String> {
        let ext = self.append_extension.trim().trim_start_matches('.');
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_string())
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            overwrite: true,
            generate_report: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RecordSplitError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RecordSplitError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| RecordSplitError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                // Try to load from default locations
                let default_paths = ["recordsplit.toml", ".recordsplit.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.directory = output_dir.clone();
        }

        if let Some(ref extension) = cli_args.extension {
            self.naming.append_extension = extension.clone();
        }

        if let Some(max_length) = cli_args.max_name_length {
            self.naming.max_length = max_length;
        }

        if let Some(overwrite) = cli_args.overwrite {
            self.output.overwrite = overwrite;
        }

        if let Some(generate_report) = cli_args.generate_report {
            self.output.generate_report = generate_report;
        }

        if let Some(lossy) = cli_args.lossy_decoding {
            self.input.lossy_decoding = lossy;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| RecordSplitError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| RecordSplitError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(8..=255).contains(&self.naming.max_length) {
            return Err(RecordSplitError::Config {
                message: format!(
                    "Maximum name length must be between 8 and 255 bytes, got {}",
                    self.naming.max_length
                ),
            });
        }

        let stem = &self.naming.fallback_stem;
        if sanitize_filename(stem, self.naming.max_length).as_deref() != Some(stem.as_str()) {
            return Err(RecordSplitError::Config {
                message: format!("Fallback name is not a valid filename: '{}'", stem),
            });
        }

        if let Some(ext) = self.naming.extension() {
            let valid = ext
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');
            if !valid || ext.ends_with('.') {
                return Err(RecordSplitError::Config {
                    message: format!("Invalid file extension: '{}'", ext),
                });
            }
        }

        if self.output.directory.as_os_str().is_empty() {
            return Err(RecordSplitError::Config {
                message: "Output directory must not be empty".to_string(),
            });
        }

        if self.input.default_source.as_os_str().is_empty() {
            return Err(RecordSplitError::Config {
                message: "Default source file must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub max_name_length: Option<usize>,
    pub overwrite: Option<bool>,
    pub generate_report: Option<bool>,
    pub lossy_decoding: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_max_name_length(mut self, max_length: Option<usize>) -> Self {
        self.max_name_length = max_length;
        self
    }

    pub fn with_overwrite(mut self, overwrite: Option<bool>) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_generate_report(mut self, generate_report: Option<bool>) -> Self {
        self.generate_report = generate_report;
        self
    }

    pub fn with_lossy_decoding(mut self, lossy: Option<bool>) -> Self {
        self.lossy_decoding = lossy;
        self
    }
}
