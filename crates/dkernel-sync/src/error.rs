//! Error types for notebook handling.

use std::path::PathBuf;

/// Result type for notebook operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while reading, executing or writing notebooks.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Failed to read the notebook file.
    #[error("Failed to read file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    /// Failed to write the notebook file.
    #[error("Failed to write file {path}: {message}")]
    WriteError { path: PathBuf, message: String },

    /// Failed to serialize/deserialize JSON.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid notebook structure.
    #[error("Invalid notebook: {0}")]
    InvalidNotebook(String),

    /// The kernel failed while executing a cell.
    #[error("Kernel error in cell {index}: {source}")]
    Kernel {
        index: usize,
        source: dkernel_core::Error,
    },
}
