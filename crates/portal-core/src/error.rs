//! Error types for the complaint portal

use thiserror::Error;

/// Main error type for the complaint portal
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Validation error
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// A uniqueness constraint rejected the write
    #[error("Conflict: {resource} already exists")]
    Conflict {
        /// Resource that collided
        resource: String,
    },

    /// Not found error
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attachment storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a validation error for `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error reports a uniqueness collision
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_panics_doc,
    clippy::uninlined_format_args,
    clippy::match_same_arms
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as StdError;
    use std::io;

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let app_error = Error::from(io_error);

        match app_error {
            Error::Io(_) => {}
            _ => panic!("Expected Io error variant"),
        }

        assert!(format!("{}", app_error).contains("I/O error"));
        assert!(app_error.source().is_some());
    }

    #[test]
    fn test_configuration_error() {
        let error = Error::Configuration {
            message: "Invalid database URL".to_string(),
        };

        assert_eq!(
            format!("{}", error),
            "Configuration error: Invalid database URL"
        );
    }

    #[test]
    fn test_validation_error() {
        let error = Error::validation("title", "must be at least 5 characters");

        assert_eq!(
            format!("{}", error),
            "Validation error: title - must be at least 5 characters"
        );
    }

    #[test]
    fn test_database_error() {
        let error = Error::Database("Connection failed".to_string());
        assert_eq!(format!("{}", error), "Database error: Connection failed");
    }

    #[test]
    fn test_conflict_error() {
        let error = Error::Conflict {
            resource: "tracking_id PC-0000ABCD".to_string(),
        };

        assert!(error.is_conflict());
        assert_eq!(
            format!("{}", error),
            "Conflict: tracking_id PC-0000ABCD already exists"
        );
        assert!(!Error::Other("x".to_string()).is_conflict());
    }

    #[test]
    fn test_not_found_error() {
        let error = Error::NotFound {
            resource: "complaint 42".to_string(),
        };
        assert_eq!(format!("{}", error), "Resource not found: complaint 42");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json")
            .expect_err("invalid json must fail");
        let error = Error::from(json_error);

        assert!(matches!(error, Error::Serialization(_)));
        assert!(format!("{}", error).starts_with("Serialization error:"));
    }

    #[test]
    fn test_storage_and_other_errors() {
        let storage = Error::Storage("disk full".to_string());
        assert_eq!(format!("{}", storage), "Storage error: disk full");

        let other = Error::Other("something odd".to_string());
        assert_eq!(format!("{}", other), "something odd");
    }
}
