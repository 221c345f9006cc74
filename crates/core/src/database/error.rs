//! Error types for database connections

use thiserror::Error;

/// Message prefixes DuckDB uses for missing files and unreachable objects
const SOURCE_UNAVAILABLE_PREFIXES: &[&str] = &["IO Error", "HTTP Error"];

/// Errors reported by the analytical store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// The handle could not be opened, configured or closed
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// A named source partition does not exist
    #[error("Source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// Any other failure while running SQL
    #[error("Execution error: {message}")]
    Execution { message: String },
}

impl DatabaseError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Classify a failure message reported by the store while executing SQL
    ///
    /// File-scan functions surface a missing partition as an IO error (local
    /// files) or an HTTP error (object stores); those become
    /// [`DatabaseError::SourceUnavailable`], everything else is an execution
    /// failure.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let trimmed = message.trim_start();
        if SOURCE_UNAVAILABLE_PREFIXES
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
        {
            Self::SourceUnavailable { message }
        } else {
            Self::Execution { message }
        }
    }

    /// The store-reported message
    pub fn message(&self) -> &str {
        match self {
            DatabaseError::Connection { message }
            | DatabaseError::SourceUnavailable { message }
            | DatabaseError::Execution { message } => message,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            DatabaseError::Connection { message } => {
                format!(
                    "Cannot open database: {message}\n\n\
                    Hint: Check the database path and that no other process holds a write lock."
                )
            }
            DatabaseError::SourceUnavailable { message } => {
                format!(
                    "Source data not found: {message}\n\n\
                    Hint: Check the source base path and credentials."
                )
            }
            DatabaseError::Execution { .. } => self.to_string(),
        }
    }
}

#[cfg(feature = "duckdb-backend")]
impl From<duckdb::Error> for DatabaseError {
    fn from(err: duckdb::Error) -> Self {
        DatabaseError::classify(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_missing_files() {
        let err = DatabaseError::classify(
            "IO Error: No files found that match the pattern \"/data/locationid=1/year=2024/month=01/*\"",
        );
        assert!(matches!(err, DatabaseError::SourceUnavailable { .. }));

        let err = DatabaseError::classify("HTTP Error: HTTP GET error on 's3://bucket/x' (HTTP 404)");
        assert!(matches!(err, DatabaseError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_classify_other_failures() {
        let err = DatabaseError::classify("Catalog Error: Table with name measurements does not exist!");
        assert!(matches!(err, DatabaseError::Execution { .. }));

        let err = DatabaseError::classify("Parser Error: syntax error at or near \"SELEC\"");
        assert_eq!(err.message(), "Parser Error: syntax error at or near \"SELEC\"");
    }

    #[test]
    fn test_user_message() {
        let err = DatabaseError::connection("Could not set lock on file \"air_quality.db\"");
        let msg = err.user_message();
        assert!(msg.contains("air_quality.db"));
        assert!(msg.contains("Hint:"));
    }
}
