//! Error types for the file organiser

use crate::model::RunResult;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for file organiser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop a run before or instead of completing it
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid directory {path}: {reason}")]
    InvalidDirectory { path: PathBuf, reason: String },

    #[error("Refusing to organise {path}: {reason}")]
    ForbiddenDirectory { path: PathBuf, reason: String },

    #[error("Invalid category name '{name}': {reason}")]
    InvalidCategory { name: String, reason: String },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    /// The run was cancelled; the boxed result holds everything recorded before the signal
    #[error("Run interrupted after {} files", .0.processed)]
    Interrupted(Box<RunResult>),
}

impl Error {
    /// Partial result carried by an interruption, if this is one
    pub fn partial_result(&self) -> Option<&RunResult> {
        match self {
            Error::Interrupted(result) => Some(result),
            _ => None,
        }
    }
}

/// Cause of a single file failing to move
///
/// Every variant is recorded against the offending file and never aborts a run.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveError {
    #[error("Source file does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("Source path is not a file: {path}")]
    NotAFile { path: PathBuf },

    #[error("Permission denied for {path}: {message}")]
    PermissionDenied { path: PathBuf, message: String },

    #[error("Destination directory does not exist: {path}")]
    DestinationMissing { path: PathBuf },

    #[error("Unable to generate unique filename for '{name}' after {attempts} attempts")]
    UniqueNameExhausted { name: String, attempts: usize },

    #[error("Filename '{name}' cannot fit within {max_bytes} bytes")]
    NameTooLong { name: String, max_bytes: usize },

    #[error("Cross-device copy from {from} to {to} failed: {message}")]
    CrossDeviceCopy {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    #[error("Integrity check failed: {destination} does not match {source_path}")]
    IntegrityMismatch {
        source_path: PathBuf,
        destination: PathBuf,
    },

    #[error("Invalid category name '{name}': {reason}")]
    InvalidCategory { name: String, reason: String },

    #[error("IO error on {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl MoveError {
    /// Classify an I/O error raised while operating on `path`
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => MoveError::NotFound { path },
            io::ErrorKind::PermissionDenied => MoveError::PermissionDenied {
                path,
                message: err.to_string(),
            },
            io::ErrorKind::IsADirectory => MoveError::NotAFile { path },
            _ => MoveError::Io {
                path,
                message: err.to_string(),
            },
        }
    }
}

impl From<Error> for MoveError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidCategory { name, reason } => MoveError::InvalidCategory { name, reason },
            other => MoveError::Io {
                path: PathBuf::new(),
                message: other.to_string(),
            },
        }
    }
}
