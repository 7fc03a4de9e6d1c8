//! Error types for claude-switch operations

use crate::apply::links::LinkFailures;
use crate::lock::LockError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during profile and switch operations
#[derive(Error, Debug)]
pub enum SwitchError {
    /// Input failed validation before anything was touched
    #[error("{0}")]
    Validation(String),

    /// A named profile or backup does not exist
    #[error("{0}")]
    NotFound(String),

    /// The operation conflicts with existing state
    #[error("{0}")]
    Conflict(String),

    /// Live state is not in a shape the operation can safely change
    #[error("{0}")]
    Integrity(String),

    #[error("Home directory not found")]
    NoHomeDir,

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Links(#[from] LinkFailures),

    #[error("Failed to access {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A switch failed part way and live state was restored
    #[error("Switch to '{profile}' failed and was rolled back: {source}")]
    RolledBack {
        profile: String,
        #[source]
        source: Box<SwitchError>,
    },
}

impl SwitchError {
    /// Get a stable machine-readable code for this error
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SwitchError::Validation(_) => "VALIDATION_ERROR",
            SwitchError::NotFound(_) => "NOT_FOUND",
            SwitchError::Conflict(_) => "CONFLICT",
            SwitchError::Integrity(_) => "INTEGRITY_ERROR",
            SwitchError::NoHomeDir => "CONFIG_ERROR",
            SwitchError::Lock(e) => e.code(),
            SwitchError::Links(e) => e.code(),
            SwitchError::File { .. } | SwitchError::Io(_) => "IO_ERROR",
            SwitchError::Parse { .. } | SwitchError::Json(_) => "PARSE_ERROR",
            SwitchError::RolledBack { .. } => "SWITCH_ROLLED_BACK",
        }
    }

    /// Attach a path to an I/O error
    pub fn file(path: impl AsRef<Path>, source: io::Error) -> Self {
        SwitchError::File {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Attach a path to a JSON decoding error
    pub fn parse(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        SwitchError::Parse {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn profile_not_found(name: &str) -> Self {
        SwitchError::NotFound(format!("Profile '{name}' does not exist"))
    }
}

/// Result type for claude-switch operations
pub type SwitchResult<T> = Result<T, SwitchError>;
