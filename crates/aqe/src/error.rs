//! CLI error type

use std::path::PathBuf;

use air_quality_core::{DatabaseError, PipelineError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] PipelineError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Failed to destroy database {path}: {source}")]
    DestroyError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    OutputError(String),
}

impl CliError {
    /// Get a user-friendly error message with hints
    pub fn user_message(&self) -> String {
        match self {
            CliError::PipelineError(e) => e.user_message(),
            CliError::DatabaseError(e) => e.user_message(),
            CliError::MissingArgument(name) => format!(
                "Missing required value: {}\n\nHint: Pass --{} or set it in the --config file",
                name, name
            ),
            CliError::DestroyError { path, source } => format!(
                "Could not remove {}: {}\n\nHint: Check that no other process has the database open",
                path.display(),
                source
            ),
            CliError::OutputError(_) => self.to_string(),
        }
    }
}
