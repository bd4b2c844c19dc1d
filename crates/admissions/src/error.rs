//! Error types for the admission register.
//!
//! Every fallible operation in this crate returns [`Result`]. Storage failures
//! are carried through unchanged so the caller decides how to present them;
//! nothing here retries or drops an error.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for admission register operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Errors ===
    /// No student record exists with the given id.
    #[error("student not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A required field is missing or malformed.
    ///
    /// Raised before anything is written to storage.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to bootstrap the database schema.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for admission register operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error for the given record id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a validation error for a named field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the requested record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error was raised by input validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from the storage backend or the file system.
    ///
    /// These are the errors a caller would report as "storage unavailable".
    #[must_use]
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
                | Self::Io(_)
                | Self::DirectoryCreate { .. }
                | Self::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("abc123");
        assert_eq!(err.to_string(), "student not found: abc123");
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_display() {
        let err = Error::validation("child_name", "must not be empty");
        assert_eq!(err.to_string(), "invalid child_name: must not be empty");
        assert!(err.is_validation());
        assert!(!err.is_backend_unavailable());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
        assert!(!err.is_backend_unavailable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(err.is_backend_unavailable());
    }

    #[test]
    fn test_json_error_is_backend_error() {
        let json_err = serde_json::from_str::<Vec<i32>>("{").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_backend_unavailable());
    }

    #[test]
    fn test_config_load_is_not_backend_error() {
        let figment_err = figment::Figment::new()
            .merge(figment::providers::Serialized::default("year", "not a number"))
            .extract_inner::<u16>("year")
            .unwrap_err();
        let err = Error::from(figment_err);
        assert!(matches!(err, Error::ConfigLoad(_)));
        assert!(!err.is_backend_unavailable());
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
        assert!(err.is_backend_unavailable());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "school_name must not be empty".to_string(),
        };
        assert!(err.to_string().contains("school_name"));
        assert!(!err.is_backend_unavailable());
    }
}
