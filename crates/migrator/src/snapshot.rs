//! Legacy snapshot retrieval
//!
//! One GET against the deployed script endpoint. Any failure here is fatal:
//! nothing has been written yet, so the run aborts before touching the
//! backend.

use common::NetworkError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::SnapshotConfig;
use crate::error::Result;
use crate::legacy::Snapshot;

pub struct SnapshotFetcher {
    client: Client,
    endpoint: Url,
    action: String,
    timeout: Option<Duration>,
}

impl SnapshotFetcher {
    pub fn new(
        endpoint: Url,
        action: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            action: action.into(),
            timeout,
        })
    }

    pub fn from_config(config: &SnapshotConfig) -> Result<Self> {
        Self::new(config.endpoint()?, config.action.clone(), config.timeout())
    }

    /// Download and decode the full legacy dataset
    pub async fn fetch(&self) -> Result<Snapshot> {
        info!("Fetching legacy snapshot from {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("action", self.action.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::HttpError {
                status_code: status.as_u16(),
                message: body,
            }
            .into());
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!("Snapshot payload is {} bytes", body.len());

        let snapshot = Snapshot::from_json(&body).map_err(|e| NetworkError::InvalidResponse {
            details: format!("snapshot is not a JSON object of collections: {e}"),
        })?;

        info!(
            records = snapshot.record_count(),
            invalid = snapshot.invalid_count(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    fn transport_error(&self, error: reqwest::Error) -> NetworkError {
        match self.timeout {
            Some(timeout) if error.is_timeout() => NetworkError::Timeout {
                timeout_secs: timeout.as_secs(),
            },
            _ => NetworkError::connection_failed(self.endpoint.as_str(), error),
        }
    }
}
