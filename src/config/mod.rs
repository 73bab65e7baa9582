//! Configuration management for swcache

pub mod schema;

pub use schema::Config;

use crate::error::{SwcacheError, SwcacheResult};
use crate::lifecycle::manifest::StaticAssetManifest;
use crate::version::VersionTag;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

/// Journal file name inside the storage root
pub const JOURNAL_FILE: &str = "journal.log";

/// Environment variable overriding `worker.version`
pub const VERSION_ENV: &str = "SWCACHE_VERSION";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("swcache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("swcache")
    }

    /// Default storage root for cache stores
    pub fn default_storage_dir() -> PathBuf {
        Self::state_dir().join("caches")
    }

    /// Load configuration, using defaults if the file does not exist.
    ///
    /// `SWCACHE_VERSION`, when set, replaces `worker.version`.
    pub async fn load(&self) -> SwcacheResult<Config> {
        let mut config = self.load_saved().await?;

        if let Ok(version) = std::env::var(VERSION_ENV) {
            debug!("Version overridden by {}: {}", VERSION_ENV, version);
            config.worker.version = version;
        }

        Ok(config)
    }

    /// Configuration as stored in the file, without environment overrides
    pub async fn load_saved(&self) -> SwcacheResult<Config> {
        if self.config_path.exists() {
            self.load_from_file(&self.config_path).await
        } else {
            debug!("Config file not found, using defaults");
            Ok(Config::default())
        }
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> SwcacheResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SwcacheError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| SwcacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> SwcacheResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SwcacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> SwcacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SwcacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Validated version tag
    pub fn version_tag(&self) -> SwcacheResult<VersionTag> {
        VersionTag::new(self.worker.version.clone())
    }

    /// Parsed scope URL
    pub fn scope_url(&self) -> SwcacheResult<Url> {
        Url::parse(&self.worker.scope).map_err(|e| SwcacheError::UrlInvalid {
            url: self.worker.scope.clone(),
            reason: e.to_string(),
        })
    }

    pub fn static_manifest(&self) -> StaticAssetManifest {
        StaticAssetManifest::new(self.worker.manifest.clone())
    }

    /// Storage root, falling back to the state directory
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(ConfigManager::default_storage_dir)
    }

    /// Journal file, kept beside the stores it describes
    pub fn journal_path(&self) -> PathBuf {
        self.storage_dir().join(JOURNAL_FILE)
    }
}
