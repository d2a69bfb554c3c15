//! Error types for the lesson-plan core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all session and store operations.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// SQLite connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Saved plan not found for the given ID
    #[error("Lesson plan with ID {id} not found")]
    PlanNotFound { id: String },
    /// Education model not found for the given ID
    #[error("Education model with ID {id} not found")]
    ModelNotFound { id: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// No authoring category chosen before generating or saving
    #[error("Select an authoring category (reading, discussion, writing, language-activity) first")]
    MissingCategory,
    /// Saving was requested before any result was generated
    #[error("Generate the lesson plan before saving it")]
    MissingResult,
    /// The completion endpoint failed or returned an unusable body
    #[error("Generation failed: {message}")]
    Generation { message: String },
    /// Transport-level HTTP failures
    #[error("HTTP request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> PlannerError {
        PlannerError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> PlannerError {
        PlannerError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl PlannerError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a generation error from any displayable message.
    pub fn generation(message: impl fmt::Display) -> Self {
        PlannerError::Generation {
            message: message.to_string(),
        }
    }

    /// Wraps a blocking-task join failure.
    pub fn join(error: tokio::task::JoinError) -> Self {
        PlannerError::Configuration {
            message: format!("Task join error: {error}"),
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| PlannerError::database(message).with_source(e))
    }
}

/// Extension trait for attaching a path to I/O failures.
pub trait IoResultExt<T> {
    /// Map I/O errors to [`PlannerError::FileSystem`] for the given path.
    fn fs_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| PlannerError::FileSystem {
            path: path.into(),
            source,
        })
    }
}

/// Result type alias for session and store operations
pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_builder() {
        let err = PlannerError::invalid_input("hours").with_reason("must be a number");
        assert_eq!(
            err.to_string(),
            "Invalid input for field 'hours': must be a number"
        );
    }

    #[test]
    fn test_generation_error_keeps_raw_text() {
        let err = PlannerError::generation("502 Bad Gateway");
        assert!(err.to_string().contains("502 Bad Gateway"));
    }

    #[test]
    fn test_fs_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = result.fs_context("/tmp/nowhere").unwrap_err();
        assert!(matches!(err, PlannerError::FileSystem { .. }));
        assert!(err.to_string().contains("/tmp/nowhere"));
    }
}
