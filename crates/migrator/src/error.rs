//! Error types for the migrator

use common::{BonesquadError, ConfigurationError, NetworkError};
use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendError;

/// Main error type for the migrator
///
/// Anything that reaches `main` as an [`Error`] aborts the run. Per-record
/// backend failures are counted by the stages and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),

    /// Snapshot retrieval error
    #[error("Snapshot error: {0}")]
    Network(#[from] NetworkError),

    /// Backend error outside per-record writes
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Report output error
    #[error("Failed to write report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl BonesquadError for Error {}

impl Error {
    /// Get error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config(_) => "MIGRATOR_CONFIG_ERROR",
            Error::Network(_) => "MIGRATOR_SNAPSHOT_ERROR",
            Error::Backend(_) => "MIGRATOR_BACKEND_ERROR",
            Error::HttpClient(_) => "MIGRATOR_HTTP_CLIENT_ERROR",
            Error::Serialization(_) => "MIGRATOR_SERIALIZATION_ERROR",
            Error::Report { .. } => "MIGRATOR_REPORT_ERROR",
            Error::Other(_) => "MIGRATOR_OTHER_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Table;

    #[test]
    fn test_error_codes() {
        let config: Error = ConfigurationError::missing("backend.url").into();
        assert_eq!(config.error_code(), "MIGRATOR_CONFIG_ERROR");

        let fetch: Error = NetworkError::HttpError {
            status_code: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(fetch.error_code(), "MIGRATOR_SNAPSHOT_ERROR");

        let backend: Error = BackendError::rejected(Table::Groups, 401, "no").into();
        assert_eq!(backend.error_code(), "MIGRATOR_BACKEND_ERROR");
    }

    #[test]
    fn test_display_wraps_source() {
        let err: Error = ConfigurationError::missing("snapshot.url").into();
        assert!(err.to_string().starts_with("Configuration error:"));
        assert!(err.to_string().contains("snapshot.url"));
    }
}
