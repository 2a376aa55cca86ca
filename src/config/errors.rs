//! Configuration errors

use std::path::PathBuf;

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("page_size must be > 0")]
    ZeroPageSize,

    #[error("buffer_pages must be >= 3, got {0}")]
    BufferTooSmall(usize),

    #[error("Spill directory {path} is unusable: {source}")]
    SpillDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
