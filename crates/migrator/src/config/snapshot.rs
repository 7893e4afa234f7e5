//! Legacy snapshot source configuration

use common::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::required_url;

/// Legacy snapshot endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Deployed script endpoint serving the legacy dataset
    pub url: Option<String>,

    /// Value of the `action` query parameter
    pub action: String,

    /// Optional request timeout in seconds; unset waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            url: None,
            action: "getAllData".to_string(),
            timeout_secs: None,
        }
    }
}

impl SnapshotConfig {
    /// Parsed snapshot endpoint
    pub fn endpoint(&self) -> Result<Url, ConfigurationError> {
        required_url("snapshot.url", self.url.as_deref())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
