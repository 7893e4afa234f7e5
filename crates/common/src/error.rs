//! Error handling for Bonesquad
//!
//! Core error infrastructure shared by every Bonesquad crate:
//! - `BonesquadError` marker trait for consistent error handling
//! - Domain error enums for configuration and network failures
//!
//! Library code uses these `thiserror` enums; binaries wrap them with `anyhow`
//! at the edge.

use thiserror::Error;

/// Base trait for all Bonesquad-specific errors
///
/// Implementors are thread-safe and `'static` so they can cross `.await`
/// points and be boxed freely.
pub trait BonesquadError: std::error::Error + Send + Sync + 'static {}

/// Network-related errors
///
/// Raised by HTTP exchanges with remote services (snapshot source, hosted
/// backend).
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Connection failed to establish
    #[error("Failed to connect to {endpoint}: {source}")]
    ConnectionFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Request timed out
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Remote answered with a non-success status
    #[error("HTTP error {status_code}: {message}")]
    HttpError { status_code: u16, message: String },

    /// Invalid response format
    #[error("Invalid response format: {details}")]
    InvalidResponse { details: String },
}

impl BonesquadError for NetworkError {}

/// Configuration-related errors
///
/// These errors occur during configuration loading, parsing, or validation.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {key}: {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    /// Environment variable error
    #[error("Environment variable error for {var}: {details}")]
    EnvironmentError { var: String, details: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {details}")]
    ValidationFailed { details: String },
}

impl BonesquadError for ConfigurationError {}

impl NetworkError {
    /// Create a connection failed error from any error type
    pub fn connection_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConnectionFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }
}

impl ConfigurationError {
    /// Create a validation failed error
    pub fn validation_failed(details: impl Into<String>) -> Self {
        Self::ValidationFailed {
            details: details.into(),
        }
    }

    /// Create a missing-setting error
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingRequired { key: key.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let network_err = NetworkError::connection_failed(
            "script.google.com",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused"),
        );

        let display = format!("{network_err}");
        assert!(display.contains("script.google.com"));
        assert!(display.contains("Failed to connect"));
        assert!(network_err.source().is_some());
    }

    #[test]
    fn test_http_error_display() {
        let err = NetworkError::HttpError {
            status_code: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: Service Unavailable");
    }

    #[test]
    fn test_configuration_helpers() {
        let err = ConfigurationError::missing("backend.url");
        assert_eq!(
            err.to_string(),
            "Missing required configuration: backend.url"
        );

        let err = ConfigurationError::validation_failed("3 settings missing");
        assert!(err.to_string().contains("3 settings missing"));
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_bonesquad_error<E: BonesquadError>() {}
        assert_bonesquad_error::<NetworkError>();
        assert_bonesquad_error::<ConfigurationError>();
    }
}
