//! Error types for jotter.

use thiserror::Error;

/// Result type alias using jotter's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for jotter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource already exists (unique constraint)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Completion provider answered with a non-success status
    #[error("Provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Neither a user credential nor a server default is configured
    #[error("No AI credentials configured")]
    MissingCredentials,

    /// Sealing, unsealing, hashing or token failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the failure happened before a completion stream was
    /// established, i.e. the attempt can be retried with another credential.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Error::Request(_) | Error::Provider { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("note".to_string());
        assert_eq!(err.to_string(), "Not found: note");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("key exists".to_string());
        assert_eq!(err.to_string(), "Conflict: key exists");
    }

    #[test]
    fn test_error_display_provider() {
        let err = Error::Provider {
            status: 401,
            message: "Incorrect API key".to_string(),
        };
        assert_eq!(err.to_string(), "Provider error (401): Incorrect API key");
    }

    #[test]
    fn test_missing_credentials_is_distinct() {
        let err = Error::MissingCredentials;
        assert_eq!(err.to_string(), "No AI credentials configured");
        assert!(!err.is_connect_failure());
    }

    #[test]
    fn test_connect_failure_classification() {
        assert!(Error::Request("connection reset".into()).is_connect_failure());
        assert!(Error::Provider {
            status: 500,
            message: "boom".into()
        }
        .is_connect_failure());
        assert!(!Error::Inference("stream broke".into()).is_connect_failure());
        assert!(!Error::InvalidInput("empty".into()).is_connect_failure());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
