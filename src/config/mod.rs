//! Execution configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default. A loaded config is always validated before use.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

/// Smallest buffer budget any operator accepts: two inputs plus one output.
pub const MIN_BUFFER_PAGES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Page byte budget (default 4096)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Buffer budget B in pages (default 16)
    #[serde(default = "default_buffer_pages")]
    pub buffer_pages: usize,

    /// Directory for spill files (default: system temp dir)
    #[serde(default = "default_spill_dir")]
    pub spill_dir: PathBuf,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_page_size() -> usize {
    4096
}
fn default_buffer_pages() -> usize {
    16
}
fn default_spill_dir() -> PathBuf {
    std::env::temp_dir()
}
fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            buffer_pages: default_buffer_pages(),
            spill_dir: default_spill_dir(),
            log_level: default_log_level(),
        }
    }
}

impl ExecConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: ExecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks numeric bounds. The spill directory is checked when a context
    /// is built from this config.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.buffer_pages < MIN_BUFFER_PAGES {
            return Err(ConfigError::BufferTooSmall(self.buffer_pages));
        }
        Ok(())
    }

    /// Creates the spill directory if it is missing
    pub fn ensure_spill_dir(&self) -> ConfigResult<()> {
        fs::create_dir_all(&self.spill_dir).map_err(|source| ConfigError::SpillDir {
            path: self.spill_dir.clone(),
            source,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_buffer_pages(mut self, buffer_pages: usize) -> Self {
        self.buffer_pages = buffer_pages;
        self
    }

    pub fn with_spill_dir(mut self, spill_dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = spill_dir.into();
        self
    }

    pub fn with_log_level(mut self, log_level: Severity) -> Self {
        self.log_level = log_level;
        self
    }
}
