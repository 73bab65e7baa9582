//! Registration persistence
//!
//! Remembers which version is active (routes requests) and which one is
//! installed but still waiting, across process runs.

use crate::error::{SwcacheError, SwcacheResult};
use crate::version::VersionTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File name of the registration record inside the storage root
pub const REGISTRATION_FILE: &str = "registration.json";

/// Persisted registration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// Version serving requests
    pub active: Option<VersionTag>,

    /// Installed version not yet activated
    pub waiting: Option<VersionTag>,

    /// When the record was last changed
    pub updated_at: DateTime<Utc>,
}

impl Default for Registration {
    fn default() -> Self {
        Self {
            active: None,
            waiting: None,
            updated_at: Utc::now(),
        }
    }
}

impl Registration {
    /// Registration file path for a storage root
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(REGISTRATION_FILE)
    }

    /// Load from file; a missing file means nothing is registered
    pub async fn load(path: &Path) -> SwcacheResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            SwcacheError::io(format!("reading registration {}", path.display()), e)
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save to file
    pub async fn save(&self, path: &Path) -> SwcacheResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                SwcacheError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            SwcacheError::io(format!("writing registration {}", path.display()), e)
        })
    }

    /// Record a successful install that is waiting to activate
    pub fn set_waiting(&mut self, version: VersionTag) {
        self.waiting = Some(version);
        self.updated_at = Utc::now();
    }

    /// Record an activation; clears `waiting` if it was this version
    pub fn set_active(&mut self, version: VersionTag) {
        if self.waiting.as_ref() == Some(&version) {
            self.waiting = None;
        }
        self.active = Some(version);
        self.updated_at = Utc::now();
    }

    /// Forget everything (after all stores were purged)
    pub fn clear(&mut self) {
        self.active = None;
        self.waiting = None;
        self.updated_at = Utc::now();
    }
}
