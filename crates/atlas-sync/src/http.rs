//! # HTTP Remote
//!
//! The production [`RemoteApi`] implementation: one committed
//! transaction per `POST {api_base_url}/sync`, acknowledged by a JSON
//! body `{"success": bool, "error"?: string}`.
//!
//! Any transport failure, non-2xx status, or `success: false` answer is
//! a failure for that transaction only; the caller leaves it queued and
//! retries on a later cycle.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use atlas_core::Transaction;
use atlas_store::{RemoteApi, RemoteError};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Wire Types
// =============================================================================

/// Acknowledgment body returned by the sync endpoint.
#[derive(Debug, Deserialize)]
struct SyncAck {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Reqwest-backed remote endpoint client.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// Builds a client from the sync configuration.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        Ok(HttpRemote {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn push_transaction(&self, transaction: &Transaction) -> Result<(), RemoteError> {
        let url = format!("{}/sync", self.base_url);

        debug!(id = %transaction.id, url = %url, "Pushing transaction");

        let response = self
            .client
            .post(&url)
            .json(transaction)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Rejected(format!("HTTP {status}")));
        }

        let ack: SyncAck = response
            .json()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        if ack.success {
            Ok(())
        } else {
            Err(RemoteError::Rejected(
                ack.error.unwrap_or_else(|| "unspecified remote error".to_string()),
            ))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
