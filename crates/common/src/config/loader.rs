//! # Configuration Loader
//!
//! Figment-based configuration loading with layered support:
//! 1. Compiled defaults
//! 2. Configuration file (TOML)
//! 3. Well-known unprefixed environment aliases
//! 4. Prefixed environment variable overrides
//!
//! Later layers win over earlier ones.

use crate::error::ConfigurationError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "bonesquad.toml";

/// Environment variable prefix for Bonesquad
pub const DEFAULT_ENV_PREFIX: &str = "BONESQUAD";

/// Environment variable that points at a configuration file
pub const CONFIG_PATH_ENV: &str = "BONESQUAD_CONFIG_PATH";

/// An unprefixed environment variable mapped onto a configuration key
///
/// Lets deployments keep the variable names their other tooling already
/// exports (e.g. `SUPABASE_SERVICE_ROLE_KEY` → `backend.service_role_key`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvAlias {
    /// Environment variable name, matched case-insensitively
    pub var: String,
    /// Dotted configuration key the value lands on
    pub key: String,
}

impl EnvAlias {
    pub fn new(var: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            key: key.into(),
        }
    }
}

/// Configuration loading options
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Optional path to configuration file
    pub config_path: Option<PathBuf>,
    /// Environment variable prefix
    pub env_prefix: String,
    /// Whether configuration file is required
    pub require_file: bool,
    /// Unprefixed environment variables to honour, lowest priority first
    pub env_aliases: Vec<EnvAlias>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            require_file: false,
            env_aliases: Vec::new(),
        }
    }
}

/// Load configuration in layers
///
/// # Configuration Layer Priority (highest to lowest)
/// 1. Environment variables (`<PREFIX>_*`, nested with `__`)
/// 2. Aliased unprefixed variables, later aliases winning
/// 3. Configuration file (explicit path, `BONESQUAD_CONFIG_PATH`, or `bonesquad.toml`)
/// 4. Compiled defaults
pub fn load_config_with_options<T>(options: LoadOptions) -> Result<T, ConfigurationError>
where
    T: Default + DeserializeOwned + serde::Serialize,
{
    debug!("Loading configuration with options: {:?}", options);

    let mut figment = Figment::new().merge(Serialized::defaults(T::default()));

    let config_path = determine_config_path(options.config_path)?;

    if let Some(path) = &config_path {
        if path.exists() {
            info!("Loading configuration from file: {}", path.display());
            figment = add_file_provider(figment, path)?;
        } else if options.require_file {
            return Err(ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            });
        } else {
            warn!(
                "Configuration file not found: {} (using defaults)",
                path.display()
            );
        }
    }

    for alias in options.env_aliases {
        let target = alias.key;
        figment = figment.merge(
            Env::raw()
                .only(&[alias.var.as_str()])
                .map(move |_| target.clone().into()),
        );
    }

    debug!(
        "Loading environment variables with prefix: {}",
        options.env_prefix
    );
    figment = figment.merge(
        Env::prefixed(&format!("{}_", options.env_prefix))
            .split("__")
            .ignore(&["CONFIG_PATH"]),
    );

    let config: T = figment
        .extract()
        .map_err(|err| ConfigurationError::ParseError {
            details: format!("Failed to parse configuration: {err}"),
        })?;

    debug!(
        "Configuration loaded from {} sources",
        figment.metadata().count()
    );

    Ok(config)
}

/// Determine configuration file path with fallback logic
fn determine_config_path(
    override_path: Option<PathBuf>,
) -> Result<Option<PathBuf>, ConfigurationError> {
    if let Some(path) = override_path {
        return Ok(Some(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        debug!("Using config path from environment: {}", path.display());
        return Ok(Some(path));
    }

    let current_dir_config = std::env::current_dir()
        .map_err(|e| ConfigurationError::EnvironmentError {
            var: "current_dir".to_string(),
            details: e.to_string(),
        })?
        .join(DEFAULT_CONFIG_FILE);

    if current_dir_config.exists() {
        debug!(
            "Found config file in current directory: {}",
            current_dir_config.display()
        );
        return Ok(Some(current_dir_config));
    }

    debug!("No configuration file found, using defaults");
    Ok(None)
}

/// Add file provider to figment based on file extension
fn add_file_provider(figment: Figment, path: &Path) -> Result<Figment, ConfigurationError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("toml");

    match extension.to_lowercase().as_str() {
        "toml" => Ok(figment.merge(Toml::file(path))),
        _ => Err(ConfigurationError::ParseError {
            details: format!(
                "Unsupported configuration file format: {extension} (supported: toml)"
            ),
        }),
    }
}
