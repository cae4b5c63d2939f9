//! Error types for the Circonus API client.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using the API error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the Circonus API boundary.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The requested object does not exist (HTTP 404).
    #[error("{cid} not found")]
    #[diagnostic(code(circonus_api::not_found))]
    NotFound {
        /// CID that was requested
        cid: String,
    },

    /// The API rejected the request.
    #[error("API request {method} {path} failed with status {status}: {message}")]
    #[diagnostic(
        code(circonus_api::request_failed),
        help("Check the API token and the submitted object")
    )]
    Api {
        /// HTTP method
        method: String,
        /// Request path
        path: String,
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Transport-level failure talking to the API.
    #[error("HTTP error: {0}")]
    #[diagnostic(code(circonus_api::http_error))]
    Http(#[from] reqwest::Error),

    /// A CID did not have the expected shape.
    #[error("Invalid {kind} CID: {cid:?}")]
    #[diagnostic(code(circonus_api::invalid_cid))]
    InvalidCid {
        /// Kind of object the CID should identify
        kind: &'static str,
        /// Offending value
        cid: String,
    },

    /// The client was configured incorrectly.
    #[error("Client configuration error: {message}")]
    #[diagnostic(code(circonus_api::configuration))]
    Configuration {
        /// Error message
        message: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(circonus_api::serialization_error))]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` when the API reported that the object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected() {
        let err = Error::NotFound {
            cid: "/graph/abc".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "/graph/abc not found");

        let err = Error::configuration("missing token");
        assert!(!err.is_not_found());
    }
}
