//! Error types for the Circonus provider.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using the provider error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while translating or applying a resource.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The configuration breaks a rule the API would reject.
    #[error("{message}")]
    #[diagnostic(code(circonus_provider::validation))]
    Validation {
        /// Description naming the offending attributes
        message: String,
    },

    /// A duration attribute could not be parsed or is out of range.
    #[error("Invalid {attribute} {value:?}: {reason}")]
    #[diagnostic(
        code(circonus_provider::invalid_duration),
        help("Durations use Go syntax, e.g. \"30s\", \"1m30s\" or \"2.5s\"")
    )]
    InvalidDuration {
        /// Attribute name
        attribute: String,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The API returned something the provider cannot represent.
    #[error("PROVIDER BUG: {message}")]
    #[diagnostic(
        code(circonus_provider::provider_bug),
        help("This is a bug in the provider; please report it with the resource configuration")
    )]
    ProviderBug {
        /// What went wrong
        message: String,
    },

    /// The Circonus API call failed.
    #[error("{context}: {source}")]
    #[diagnostic(code(circonus_provider::api))]
    Api {
        /// Operation and object the call was made for
        context: String,
        /// Underlying client error
        #[source]
        source: circonus_api::Error,
    },

    /// Configuration or state could not be (de)serialized.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(circonus_provider::serialization))]
    Serialization(#[from] serde_json::Error),

    /// An operation needs a resource ID but none is set.
    #[error("{kind} has no ID")]
    #[diagnostic(code(circonus_provider::missing_id))]
    MissingId {
        /// Resource kind
        kind: &'static str,
    },

    /// The API returned a check type the provider does not manage.
    #[error("Unsupported check type {check_type:?}")]
    #[diagnostic(code(circonus_provider::unsupported_check_type))]
    UnsupportedCheckType {
        /// API type string
        check_type: String,
    },

    /// Provider configuration is invalid.
    #[error("Provider configuration error: {message}")]
    #[diagnostic(
        code(circonus_provider::config),
        help("Set `key` in the provider block or CIRCONUS_API_TOKEN in the environment")
    )]
    Config {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a provider-bug error.
    #[must_use]
    pub fn provider_bug(message: impl Into<String>) -> Self {
        Self::ProviderBug {
            message: message.into(),
        }
    }

    /// Wrap an API error with the operation it came from.
    #[must_use]
    pub fn api(context: impl Into<String>, source: circonus_api::Error) -> Self {
        Self::Api {
            context: context.into(),
            source,
        }
    }

    /// Create a provider configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns `true` when the wrapped API error is a not-found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { source, .. } if source.is_not_found())
    }
}

impl From<circonus_api::Error> for Error {
    fn from(source: circonus_api::Error) -> Self {
        Self::api("Circonus API", source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_bug_is_prefixed() {
        let err = Error::provider_bug("API Config not empty: [\"x\"]");
        assert_eq!(err.to_string(), "PROVIDER BUG: API Config not empty: [\"x\"]");
    }

    #[test]
    fn api_not_found_is_detected() {
        let err = Error::api(
            "read check",
            circonus_api::Error::NotFound {
                cid: "/check_bundle/1".into(),
            },
        );
        assert!(err.is_not_found());
        assert!(!Error::validation("bad").is_not_found());
    }
}
