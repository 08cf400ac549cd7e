//! Error types for the index, storage, and runtime layers.
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for index and storage operations.
#[derive(Error, Debug)]
pub enum CogError {
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse index at '{path}': {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to persist index to '{path}': {source}")]
    PersistenceError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to acquire advisory lock on '{path}': {source}")]
    LockAcquireFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{old_text}' appears {count} times in '{path}'; edit requires exactly one match")]
    AmbiguousEdit {
        path: PathBuf,
        old_text: String,
        count: usize,
    },

    #[error("'{old_text}' was not found in '{path}'")]
    ExactNotFound { path: PathBuf, old_text: String },

    #[error("'{path}' already exists")]
    AlreadyExists { path: PathBuf },

    #[error("'{path}' is not indexed")]
    NotIndexed { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    #[error("Remote memory service error: {reason}")]
    RemoteTransportError { reason: String },

    #[error("{0}")]
    General(String),
}

impl CogError {
    /// Recovery suggestions shown alongside the error message on the CLI.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::ParseError { .. } => vec![
                "The on-disk index may be corrupted; run `cog index` to rebuild it",
            ],
            Self::LockAcquireFailure { .. } => vec![
                "Another cog process may be writing the index; wait and retry",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
            ],
            Self::AmbiguousEdit { .. } => vec![
                "Narrow `old_text` so it matches exactly one location",
            ],
            _ => vec![],
        }
    }
}

/// Result type alias used throughout the index and storage layers.
pub type IndexResult<T> = Result<T, CogError>;

/// Helper trait for adding context to errors from foreign error types.
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> Result<T, CogError>;
    fn with_path(self, path: &std::path::Path) -> Result<T, CogError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, CogError> {
        self.map_err(|e| CogError::General(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> Result<T, CogError> {
        self.map_err(|e| CogError::General(format!("Error processing '{}': {e}", path.display())))
    }
}
