//! Error types for mcp-devops-hub.

use thiserror::Error;

/// Main error type for hub operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Credentials were rejected (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials lack permission (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Too many requests (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Remote service failed (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// API returned an unexpected error status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Integration has no credentials configured
    #[error("{0} integration is not configured")]
    NotConfigured(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Map an HTTP error status and response body to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Error::Unauthorized(message),
            403 => Error::Forbidden(message),
            404 => Error::NotFound(message),
            429 => Error::RateLimited(message),
            500..=599 => Error::ServerError { status, message },
            _ => Error::Api { status, message },
        }
    }

    /// Whether the error means the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for hub operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(Error::from_status(401, "x"), Error::Unauthorized(_)));
        assert!(matches!(Error::from_status(403, "x"), Error::Forbidden(_)));
        assert!(matches!(Error::from_status(404, "x"), Error::NotFound(_)));
        assert!(matches!(Error::from_status(429, "x"), Error::RateLimited(_)));
        assert!(matches!(
            Error::from_status(503, "down"),
            Error::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            Error::from_status(418, "teapot"),
            Error::Api { status: 418, .. }
        ));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("gone".into()).is_not_found());
        assert!(!Error::Http("timeout".into()).is_not_found());
    }

    #[test]
    fn test_not_configured_message() {
        let err = Error::NotConfigured("Jira".to_string());
        assert_eq!(err.to_string(), "Jira integration is not configured");
    }
}
