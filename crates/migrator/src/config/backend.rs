//! Hosted backend configuration

use common::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use super::required_url;

/// Hosted backend (auth + relational store) configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project endpoint, e.g. `https://abcd.supabase.co`
    pub url: Option<String>,

    /// Administrative (service role) credential
    pub service_role_key: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Page size used when listing existing accounts
    pub account_page_size: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_role_key: None,
            request_timeout_secs: 30,
            account_page_size: 1000,
        }
    }
}

impl BackendConfig {
    /// Parsed project endpoint
    pub fn endpoint(&self) -> Result<Url, ConfigurationError> {
        required_url("backend.url", self.url.as_deref())
    }

    /// Administrative credential, rejecting blanks
    pub fn service_role_key(&self) -> Result<&str, ConfigurationError> {
        self.service_role_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigurationError::missing("backend.service_role_key"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "<redacted>"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("account_page_size", &self.account_page_size)
            .finish()
    }
}
