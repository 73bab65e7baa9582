//! Configuration schema for swcache
//!
//! Configuration is stored at `~/.config/swcache/config.toml`

use crate::lifecycle::manifest::DEFAULT_ENTRIES;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version tag of the stock deployment
pub const DEFAULT_VERSION: &str = "scanner39-2025-08-25-01";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Deployed version and its static assets
    pub worker: WorkerConfig,

    /// Where cache stores live
    pub storage: StorageConfig,

    /// Outbound HTTP client settings
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record lifecycle events in the journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: true,
        }
    }
}

/// Deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Build identifier; store names derive from it
    pub version: String,

    /// Base URL that relative manifest entries resolve against
    pub scope: String,

    /// Static assets pre-cached at install
    pub manifest: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            scope: "http://localhost:8080/".to_string(),
            manifest: DEFAULT_ENTRIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage root (default: `<state dir>/swcache/caches`)
    pub dir: Option<PathBuf>,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// User-Agent sent with every fetch
    pub user_agent: String,

    /// Overall per-request timeout; unset means the transport decides
    pub timeout_secs: Option<u64>,

    /// Largest response body accepted
    pub max_body_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("swcache/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
            max_body_bytes: 50 * 1024 * 1024,
        }
    }
}
