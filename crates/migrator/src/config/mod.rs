//! Configuration module for the legacy data migrator

mod avatar;
mod backend;
mod identity;
mod migration;
mod snapshot;

pub use avatar::AvatarConfig;
pub use backend::BackendConfig;
pub use identity::IdentityConfig;
pub use migration::MigrationConfig;
pub use snapshot::SnapshotConfig;

use common::config::{load_config_with_options, ConfigLoader, EnvAlias, LoadOptions};
use common::ConfigurationError as ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Unprefixed variables exported by the existing web app deployment
const ENV_ALIASES: &[(&str, &str)] = &[
    ("NEXT_PUBLIC_SUPABASE_URL", "backend.url"),
    ("SUPABASE_URL", "backend.url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "backend.service_role_key"),
    ("GOOGLE_SCRIPT_URL", "snapshot.url"),
];

/// Settings an operator must provide, with the variables that can carry them
const REQUIRED_SETTINGS: &[(&str, &str)] = &[
    (
        "backend.url",
        "BONESQUAD_BACKEND__URL, SUPABASE_URL or NEXT_PUBLIC_SUPABASE_URL",
    ),
    (
        "backend.service_role_key",
        "BONESQUAD_BACKEND__SERVICE_ROLE_KEY or SUPABASE_SERVICE_ROLE_KEY",
    ),
    ("snapshot.url", "BONESQUAD_SNAPSHOT__URL or GOOGLE_SCRIPT_URL"),
];

/// Main configuration structure for the migrator
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Hosted backend configuration
    pub backend: BackendConfig,

    /// Legacy snapshot source configuration
    pub snapshot: SnapshotConfig,

    /// Synthetic account configuration
    pub identity: IdentityConfig,

    /// Record transform configuration
    pub migration: MigrationConfig,

    /// Avatar enrichment configuration
    pub avatar: AvatarConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => <Config as ConfigLoader<Config>>::load_from_file(path),
            None => <Config as ConfigLoader<Config>>::load(None),
        }
    }

    /// Generate example configuration file
    pub fn generate_example() -> Result<String, ConfigError> {
        let mut config = Self::default();
        config.backend.url = Some("https://your-project.supabase.co".to_string());
        config.snapshot.url =
            Some("https://script.google.com/macros/s/DEPLOYMENT_ID/exec".to_string());
        toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError {
            details: format!("Failed to serialize config: {e}"),
        })
    }

    /// Validate that every required setting is present and well-formed
    pub fn validate(&self) -> Result<(), ConfigError> {
        <Config as ConfigLoader<Config>>::validate(self)
    }

    fn load_options(config_path: Option<PathBuf>, require_file: bool) -> LoadOptions {
        LoadOptions {
            config_path,
            require_file,
            env_aliases: ENV_ALIASES
                .iter()
                .map(|(var, key)| EnvAlias::new(*var, *key))
                .collect(),
            ..LoadOptions::default()
        }
    }

    fn is_set(&self, key: &str) -> bool {
        let value = match key {
            "backend.url" => self.backend.url.as_deref(),
            "backend.service_role_key" => self.backend.service_role_key.as_deref(),
            "snapshot.url" => self.snapshot.url.as_deref(),
            _ => None,
        };
        value.is_some_and(|v| !v.trim().is_empty())
    }
}

impl ConfigLoader<Config> for Config {
    fn load(path: Option<PathBuf>) -> Result<Config, ConfigError> {
        load_config_with_options(Self::load_options(path, false))
    }

    fn load_from_file(path: &Path) -> Result<Config, ConfigError> {
        load_config_with_options(Self::load_options(Some(path.to_path_buf()), true))
    }

    fn validate(config: &Config) -> Result<(), ConfigError> {
        let missing: Vec<String> = REQUIRED_SETTINGS
            .iter()
            .filter(|(key, _)| !config.is_set(key))
            .map(|(key, vars)| format!("{key} (set {vars})"))
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::validation_failed(format!(
                "missing required settings: {}",
                missing.join("; ")
            )));
        }

        config.backend.endpoint()?;
        config.backend.service_role_key()?;
        config.snapshot.endpoint()?;

        if config.backend.account_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "backend.account_page_size".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if config.identity.handle_domain.trim().is_empty()
            || config.identity.handle_domain.contains('@')
        {
            return Err(ConfigError::InvalidValue {
                key: "identity.handle_domain".to_string(),
                value: config.identity.handle_domain.clone(),
                reason: "must be a bare domain name".to_string(),
            });
        }

        if config.identity.secret_length < 12 {
            return Err(ConfigError::InvalidValue {
                key: "identity.secret_length".to_string(),
                value: config.identity.secret_length.to_string(),
                reason: "must be at least 12".to_string(),
            });
        }

        if config.migration.task_category.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "migration.task_category".to_string(),
                value: String::new(),
                reason: "must not be blank".to_string(),
            });
        }

        Ok(())
    }
}

/// Parse a required http(s) URL setting
pub(crate) fn required_url(key: &str, value: Option<&str>) -> Result<Url, ConfigError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::missing(key))?;

    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}
