//! Lifecycle journal
//!
//! Appends JSON lines to `journal.log` in the storage root describing
//! installs, activations and purges. Journal IO never fails the operation
//! being recorded.

use crate::config::schema::Config;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// File-based journal that appends JSON lines
#[derive(Debug, Clone)]
pub struct Journal {
    enabled: bool,
    path: PathBuf,
}

impl Journal {
    /// Create a journal from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.journal,
            path: config.journal_path(),
        }
    }

    /// Journal writing to an explicit file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
        }
    }

    /// Journal that records nothing
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Record an event as a JSON line
    pub async fn record(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write journal: {}", e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_json_line() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::at(dir.path().join("journal.log"));

        journal
            .record(
                "activate.completed",
                &serde_json::json!({"version": "v2", "deleted": ["html-v1"]}),
            )
            .await;

        let content = tokio::fs::read_to_string(journal.path()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();

        assert_eq!(parsed["event"], "activate.completed");
        assert_eq!(parsed["data"]["deleted"][0], "html-v1");
        assert!(parsed["timestamp"].is_string());
    }

    #[tokio::test]
    async fn appends_multiple_lines() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::at(dir.path().join("nested").join("journal.log"));

        journal.record("install.completed", &serde_json::json!({})).await;
        journal.record("activate.completed", &serde_json::json!({})).await;

        let content = tokio::fs::read_to_string(journal.path()).await.unwrap();
        assert_eq!(content.trim().lines().count(), 2);
    }

    #[tokio::test]
    async fn follows_storage_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.dir = Some(dir.path().join("caches"));

        let journal = Journal::new(&config);
        journal.record("stores.purged", &serde_json::json!({"deleted": []})).await;

        assert_eq!(journal.path(), &dir.path().join("caches").join("journal.log"));
        assert!(journal.path().exists());
    }

    #[tokio::test]
    async fn disabled_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let journal = Journal {
            enabled: false,
            path: dir.path().join("journal.log"),
        };

        journal.record("install.failed", &serde_json::json!({})).await;

        assert!(!journal.path().exists());
    }
}
