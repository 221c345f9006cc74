//! Error types for pipeline runs
//!
//! Every failure a run can surface ends up as a [`PipelineError`]. Lower-level
//! modules keep their own error enums ([`DatabaseError`], [`TemplateError`])
//! and convert into this one, so the runner can still tell a missing source
//! partition apart from a genuine execution failure.

use std::path::PathBuf;
use thiserror::Error;

use crate::database::DatabaseError;
use crate::template::TemplateError;

/// Errors that can occur during a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Connection, execution or source-availability failure reported by the store
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Template referenced a variable that was not supplied
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Script or input file vanished or never existed
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Input value failed validation (e.g. a malformed month)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Location registry could not be interpreted
    #[error("Invalid location registry {path}: {message}")]
    Registry { path: PathBuf, message: String },

    /// Pipeline configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error with path context
    #[error("IO error with {path}: {message}")]
    IoWithPath {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create an IO error with path context
    pub fn io_with_path(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::IoWithPath {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Map an IO error on `path` to `NotFound` when the file is missing
    pub fn from_io(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::io_with_path(path, message, source)
        }
    }

    /// Short, stable name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Database(DatabaseError::Connection { .. }) => "connection",
            PipelineError::Database(DatabaseError::SourceUnavailable { .. }) => {
                "source_unavailable"
            }
            PipelineError::Database(DatabaseError::Execution { .. }) => "execution",
            PipelineError::Template(_) => "template",
            PipelineError::NotFound(_) => "not_found",
            PipelineError::Validation(_) => "validation",
            PipelineError::Registry { .. } => "registry",
            PipelineError::Config(_) => "config",
            PipelineError::IoWithPath { .. } => "io",
        }
    }

    /// Whether this error reports a missing source partition
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            PipelineError::Database(DatabaseError::SourceUnavailable { .. })
        )
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Database(err) => err.user_message(),
            PipelineError::Template(err) => {
                format!("{err}\n\nHint: Check the placeholders used in the query template.")
            }
            PipelineError::NotFound(path) => {
                format!(
                    "File not found: {}\n\nHint: Check that the file exists and the path is correct.",
                    path.display()
                )
            }
            PipelineError::Validation(msg) => {
                format!(
                    "Invalid input: {msg}\n\nHint: Months are written as YYYY-MM, e.g. 2024-01."
                )
            }
            PipelineError::Registry { path, message } => {
                format!(
                    "Invalid location registry {}: {message}\n\n\
                    Hint: The registry must be a JSON object keyed by location id.",
                    path.display()
                )
            }
            PipelineError::Config(msg) => {
                format!(
                    "Configuration error: {msg}\n\nHint: Check your command-line flags and config file."
                )
            }
            _ => self.to_string(),
        }
    }
}
