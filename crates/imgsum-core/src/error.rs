//! Error types for the imgsum workflow.
//!
//! Only construction-time and truly unexpected failures are errors. Expected
//! per-image and per-call failures are carried as data in
//! [`ImageDescription`](crate::types::ImageDescription) and
//! [`SummaryResult`](crate::types::SummaryResult).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for imgsum operations.
#[derive(Error, Debug)]
pub enum SummarizerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provider construction or invocation errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file does not exist
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Provider name is not one of the known backends
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider is known but has no section in the config
    #[error("Provider '{0}' is not configured")]
    ProviderNotConfigured(String),

    /// A provider setting required to build its client is missing
    #[error("Provider '{provider}' requires setting '{key}'")]
    MissingSetting { provider: String, key: String },
}

/// Errors raised by provider backends.
///
/// Backends convert anticipated failures into soft records, so these only
/// surface for conditions the workflow treats as fatal for the whole call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request to the provider failed
    #[error("{provider} request failed: {message}")]
    Request {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Provider answered with a body we could not use
    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse { provider: String, message: String },

    /// A local model could not be loaded
    #[error("Failed to load model {model}: {message}")]
    ModelLoad { model: String, message: String },

    /// A batch call broke the one-result-per-input contract
    #[error("Describer returned {actual} results for a batch of {expected}")]
    BatchMismatch { expected: usize, actual: usize },

    /// Anything else, including panics caught at the workflow boundary
    #[error("{0}")]
    Unexpected(String),
}

/// Convenience type alias for imgsum results.
pub type Result<T> = std::result::Result<T, SummarizerError>;

/// Convenience type alias for provider results.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_includes_path() {
        let err = ConfigError::NotFound(PathBuf::from("/etc/imgsum/config.toml"));
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /etc/imgsum/config.toml"
        );
    }

    #[test]
    fn test_config_error_wraps_into_top_level() {
        let err: SummarizerError = ConfigError::UnknownProvider("gemini".into()).into();
        assert_eq!(err.to_string(), "Configuration error: Unknown provider: gemini");
    }

    #[test]
    fn test_batch_mismatch_message() {
        let err = ProviderError::BatchMismatch {
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("2 results for a batch of 3"));
    }
}
