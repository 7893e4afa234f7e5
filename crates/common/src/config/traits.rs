//! # Configuration Traits
//!
//! Core traits for configuration loading and validation.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::error::ConfigurationError;

/// Configuration loader trait
///
/// Provides a standardized interface for loading configuration with layered
/// support (defaults, files, environment variables).
pub trait ConfigLoader<C: DeserializeOwned + Send + Sync> {
    /// Load configuration with optional path override
    ///
    /// Missing files fall back to defaults; environment overrides always apply.
    fn load(path_override: Option<PathBuf>) -> Result<C, ConfigurationError>;

    /// Load configuration from a specific file, which must exist
    fn load_from_file(path: &Path) -> Result<C, ConfigurationError>;

    /// Check that everything required to run is present and well-formed
    fn validate(config: &C) -> Result<(), ConfigurationError>;
}
