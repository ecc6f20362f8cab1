//! @ai:module:intent Define error types for the benchmark harness
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all benchmark operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("'{tool}' binary not found in PATH. Install ezrknn-llm or set [tool].executable in the config")]
    ToolNotFound { tool: String },

    #[error("Model file not found: {}", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("Invalid generation report: {0}")]
    InvalidReport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// @ai:intent Whether the error is a precondition failure that must abort the process
    /// @ai:effects pure
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(self, Error::ToolNotFound { .. } | Error::ModelNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
