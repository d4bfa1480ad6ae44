//! # Configuration
//!
//! Settings come from three layers, later ones winning:
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config` or `RELRANK_CONFIG`)
//! 3. Command-line flags
//!
//! ```toml
//! max_name_length = 256
//! json_mode = true
//! ```

use relrank_core::{OutputFormat, ParseLimits, RelrankError, RunOptions};
use serde::Deserialize;
use std::path::Path;

/// Maximum config file size (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Contents of a relrank TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Maximum byte length of a quoted name.
    pub max_name_length: Option<usize>,
    /// Emit JSON instead of text.
    pub json_mode: Option<bool>,
}

impl FileConfig {
    /// Parse config text.
    pub fn from_toml(text: &str) -> Result<Self, RelrankError> {
        toml::from_str(text).map_err(|e| RelrankError::Config(e.to_string()))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, RelrankError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            RelrankError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(RelrankError::Config(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            RelrankError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub limits: ParseLimits,
    pub format: OutputFormat,
}

impl Settings {
    /// Merge defaults, an optional file config and CLI flags.
    ///
    /// `json_flag` can only switch JSON on; it never overrides a file's
    /// `json_mode = true`.
    pub fn resolve(
        file: Option<FileConfig>,
        json_flag: bool,
        max_name_length: Option<usize>,
    ) -> Result<Self, RelrankError> {
        let file = file.unwrap_or_default();
        let mut settings = Self::default();

        if let Some(max) = max_name_length.or(file.max_name_length) {
            if max == 0 {
                return Err(RelrankError::Config(
                    "max_name_length must be at least 1".to_string(),
                ));
            }
            settings.limits.max_name_length = max;
        }

        if json_flag || file.json_mode.unwrap_or(false) {
            settings.format = OutputFormat::Json;
        }

        Ok(settings)
    }

    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            limits: self.limits,
            format: self.format,
        }
    }
}
