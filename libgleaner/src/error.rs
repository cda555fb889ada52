//! Error types for Gleaner

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GleanerError>;

/// Top-level error type for the engine and binaries.
#[derive(Error, Debug)]
pub enum GleanerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] Failure),

    #[error("Fatal platform error: {0}")]
    Fatal(#[from] FatalError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GleanerError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GleanerError::InvalidInput(_) => 3,
            GleanerError::Fatal(_) => 2,
            GleanerError::Platform(Failure::Authentication(_)) => 2,
            GleanerError::Platform(_) => 1,
            GleanerError::Config(_) => 1,
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// One failed platform call, with the platform's own signal preserved so
/// triage can decide what the failure means for the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The platform answered with an HTTP error status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Credentials were rejected or never established
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The call never got a usable answer
    #[error("Network error: {0}")]
    Network(String),
}

impl Failure {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Failure::Api {
            status,
            message: message.into(),
        }
    }
}

/// An account-threatening failure. The poll loop stops as soon as one of
/// these surfaces, no matter how deep in a batch it happened.
#[derive(Error, Debug, Clone)]
#[error("{operation} failed: {failure}")]
pub struct FatalError {
    /// Platform call that hit the failure, e.g. "repost" or "unfollow"
    pub operation: String,
    pub failure: Failure,
}

impl FatalError {
    pub fn new(operation: impl Into<String>, failure: Failure) -> Self {
        FatalError {
            operation: operation.into(),
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config() {
        let err = GleanerError::Config(ConfigError::MissingField("instance".to_string()));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_platform() {
        let err = GleanerError::Platform(Failure::api(500, "oops"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_authentication() {
        let err = GleanerError::Platform(Failure::Authentication("bad token".to_string()));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_fatal() {
        let err = GleanerError::Fatal(FatalError::new("repost", Failure::api(401, "unauthorized")));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_invalid_input() {
        let err = GleanerError::InvalidInput("unknown format".to_string());
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_error_message_formatting_api() {
        let failure = Failure::api(429, "rate limited");
        assert_eq!(failure.to_string(), "API error (HTTP 429): rate limited");
    }

    #[test]
    fn test_error_message_formatting_fatal() {
        let err = FatalError::new("unfollow", Failure::api(403, "forbidden"));
        assert_eq!(
            err.to_string(),
            "unfollow failed: API error (HTTP 403): forbidden"
        );
    }

    #[test]
    fn test_config_error_wrapping() {
        let err: GleanerError = ConfigError::Invalid("window min exceeds max".to_string()).into();
        assert!(err.to_string().contains("window min exceeds max"));
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_failure_wrapping() {
        let err: GleanerError = Failure::Network("connection refused".to_string()).into();
        assert!(matches!(err, GleanerError::Platform(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
