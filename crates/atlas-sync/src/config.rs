//! # Sync Configuration
//!
//! Configuration for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     ATLAS_API_BASE_URL=https://api.example.com                          │
//! │     ATLAS_SYNC_INTERVAL_SECS=30                                         │
//! │     ATLAS_BATCH_SIZE=50                                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/atlas-pos/sync.toml (Linux)                               │
//! │     ~/Library/Application Support/com.atlas.pos/sync.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! api_base_url = "https://api.example.com"
//! sync_interval_secs = 30   # 0 disables periodic background sync
//! batch_size = 50
//! http_timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Sync Configuration
// =============================================================================

/// Complete sync engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the remote sync endpoint; transactions go to
    /// `{api_base_url}/sync`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Seconds between opportunistic background cycles.
    /// 0 disables periodic sync (connectivity-triggered cycles and
    /// explicit `start_sync` calls still work).
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,

    /// Maximum transactions pushed per batch within a cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Request timeout for a single transaction push.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_sync_interval() -> u64 {
    30
}

fn default_batch_size() -> usize {
    50
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            api_base_url: default_api_base_url(),
            sync_interval_secs: default_sync_interval(),
            batch_size: default_batch_size(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or falls back to defaults on any failure.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("no config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(SyncError::InvalidConfig(format!(
                "api_base_url must start with http:// or https://, got: {}",
                self.api_base_url
            )));
        }

        if self.batch_size == 0 {
            return Err(SyncError::InvalidConfig(
                "batch_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ATLAS_API_BASE_URL") {
            debug!(url = %url, "Overriding api_base_url from environment");
            self.api_base_url = url;
        }

        if let Ok(interval) = std::env::var("ATLAS_SYNC_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse::<u64>() {
                self.sync_interval_secs = secs;
            }
        }

        if let Ok(batch) = std::env::var("ATLAS_BATCH_SIZE") {
            if let Ok(size) = batch.parse::<usize>() {
                self.batch_size = size;
            }
        }

        if let Ok(timeout) = std::env::var("ATLAS_HTTP_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.http_timeout_secs = secs;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "atlas", "pos")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
