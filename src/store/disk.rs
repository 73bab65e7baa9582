//! On-disk cache storage
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<store-name>/<entry-hash>.entry  one file per entry
//! <root>/.staging-<uuid>/                 batch writes before they are published
//! ```
//!
//! The entry hash is the SHA-256 of the request key. An entry file holds a
//! 4-byte big-endian metadata length, the JSON metadata (key, status,
//! headers) and then the raw body. Every entry is published with a single
//! rename, so concurrent writers of one key never mix their halves: the
//! last rename wins.

use crate::error::{SwcacheError, SwcacheResult};
use crate::http::{Headers, RequestKey, Response};
use crate::store::CacheStorage;
use crate::version::validate_store_name;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const ENTRY_EXT: &str = "entry";
const STAGING_PREFIX: &str = ".staging-";
const LEN_PREFIX: usize = 4;

/// Metadata stored ahead of each body
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    key: RequestKey,
    status: u16,
    status_text: String,
    headers: Headers,
    opaque: bool,
    stored_at: DateTime<Utc>,
}

/// Cache storage backed by a directory tree
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> SwcacheResult<PathBuf> {
        validate_store_name(name)?;
        Ok(self.root.join(name))
    }

    /// File name for an entry: hex SHA-256 of the key
    fn entry_file(key: &RequestKey) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.method.as_bytes());
        hasher.update(b" ");
        hasher.update(key.url.as_bytes());
        format!("{}.{}", hex::encode(hasher.finalize()), ENTRY_EXT)
    }

    /// Serialize one entry and publish it into `dir`
    async fn write_entry(dir: &Path, key: RequestKey, response: Response) -> SwcacheResult<()> {
        let path = dir.join(Self::entry_file(&key));
        write_atomic(&path, &encode_entry(key, response)?).await
    }

    async fn read_entry(path: &Path) -> SwcacheResult<(EntryMeta, Bytes)> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| SwcacheError::store(format!("reading {}", path.display()), e))?;
        decode_entry(path, Bytes::from(bytes))
    }

    async fn remove_staging(staging: &Path) {
        if let Err(e) = fs::remove_dir_all(staging).await {
            warn!("Failed to remove staging dir {}: {}", staging.display(), e);
        }
    }

    /// Move staged entry files into an existing store
    async fn publish_files(staging: &Path, dir: &Path, files: &[String]) -> SwcacheResult<()> {
        for file in files {
            fs::rename(staging.join(file), dir.join(file))
                .await
                .map_err(|e| SwcacheError::store(format!("publishing {}", file), e))?;
        }
        Ok(())
    }
}

fn encode_entry(key: RequestKey, response: Response) -> SwcacheResult<Vec<u8>> {
    let meta = EntryMeta {
        key,
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        opaque: response.opaque,
        stored_at: Utc::now(),
    };
    let meta_json = serde_json::to_vec(&meta)?;
    let len = u32::try_from(meta_json.len())
        .map_err(|_| SwcacheError::RequestInvalid("entry metadata too large".to_string()))?;

    let mut out = Vec::with_capacity(LEN_PREFIX + meta_json.len() + response.body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&meta_json);
    out.extend_from_slice(&response.body);
    Ok(out)
}

fn decode_entry(path: &Path, bytes: Bytes) -> SwcacheResult<(EntryMeta, Bytes)> {
    let corrupt = |reason: String| SwcacheError::EntryCorrupt {
        path: path.to_path_buf(),
        reason,
    };

    let prefix: [u8; LEN_PREFIX] = bytes
        .get(..LEN_PREFIX)
        .and_then(|p| p.try_into().ok())
        .ok_or_else(|| corrupt("truncated length prefix".to_string()))?;
    let meta_end = LEN_PREFIX + u32::from_be_bytes(prefix) as usize;
    if meta_end > bytes.len() {
        return Err(corrupt("metadata runs past end of file".to_string()));
    }

    let meta = serde_json::from_slice(&bytes[LEN_PREFIX..meta_end])
        .map_err(|e| corrupt(e.to_string()))?;
    Ok((meta, bytes.slice(meta_end..)))
}

/// Write through a temporary sibling and rename into place
async fn write_atomic(path: &Path, contents: &[u8]) -> SwcacheResult<()> {
    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    fs::write(&tmp, contents)
        .await
        .map_err(|e| SwcacheError::store(format!("writing {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| SwcacheError::store(format!("publishing {}", path.display()), e))
}

async fn exists(path: &Path) -> SwcacheResult<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| SwcacheError::store(format!("checking {}", path.display()), e))
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> SwcacheResult<()> {
        let dir = self.store_dir(name)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SwcacheError::store(format!("creating store {}", dir.display()), e))
    }

    async fn has(&self, name: &str) -> SwcacheResult<bool> {
        let dir = self.store_dir(name)?;
        exists(&dir).await
    }

    async fn get(&self, name: &str, key: &RequestKey) -> SwcacheResult<Option<Response>> {
        let path = self.store_dir(name)?.join(Self::entry_file(key));
        if !exists(&path).await? {
            return Ok(None);
        }

        let (meta, body) = Self::read_entry(&path).await?;
        if &meta.key != key {
            return Err(SwcacheError::EntryCorrupt {
                path,
                reason: format!("stored key {} does not match {}", meta.key, key),
            });
        }

        Ok(Some(Response {
            status: meta.status,
            status_text: meta.status_text,
            headers: meta.headers,
            body,
            opaque: meta.opaque,
        }))
    }

    async fn put(&self, name: &str, key: RequestKey, response: Response) -> SwcacheResult<()> {
        self.open(name).await?;
        let dir = self.store_dir(name)?;
        debug!(store = name, key = %key, "put");
        Self::write_entry(&dir, key, response).await
    }

    /// Stage the whole batch, then publish it. A new store appears with one
    /// directory rename; an existing store receives one rename per entry.
    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(RequestKey, Response)>,
    ) -> SwcacheResult<()> {
        let dir = self.store_dir(name)?;

        // Repeated keys collapse to the last response
        let mut batch: HashMap<String, (RequestKey, Response)> = HashMap::new();
        for (key, response) in entries {
            batch.insert(Self::entry_file(&key), (key, response));
        }

        let staging = self
            .root
            .join(format!("{}{}", STAGING_PREFIX, Uuid::new_v4().simple()));
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| SwcacheError::store(format!("creating {}", staging.display()), e))?;

        let mut files = Vec::with_capacity(batch.len());
        for (file, (key, response)) in batch {
            if let Err(e) = Self::write_entry(&staging, key, response).await {
                Self::remove_staging(&staging).await;
                return Err(e);
            }
            files.push(file);
        }

        let count = files.len();
        if !exists(&dir).await? && fs::rename(&staging, &dir).await.is_ok() {
            debug!(store = name, count, "put_all (new store)");
            return Ok(());
        }

        let published = Self::publish_files(&staging, &dir, &files).await;
        Self::remove_staging(&staging).await;
        published?;
        debug!(store = name, count, "put_all");
        Ok(())
    }

    async fn keys(&self) -> SwcacheResult<Vec<String>> {
        if !exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| SwcacheError::store(format!("listing {}", self.root.display()), e))?;
        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| SwcacheError::store(format!("listing {}", self.root.display()), e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            let name = entry.file_name().to_string_lossy().to_string();
            if is_dir && validate_store_name(&name).is_ok() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> SwcacheResult<bool> {
        let dir = self.store_dir(name)?;
        if !exists(&dir).await? {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| SwcacheError::store(format!("deleting store {}", dir.display()), e))?;
        Ok(true)
    }

    async fn entries(&self, name: &str) -> SwcacheResult<Vec<RequestKey>> {
        let dir = self.store_dir(name)?;
        if !exists(&dir).await? {
            return Err(SwcacheError::StoreNotFound(name.to_string()));
        }

        let mut listing = fs::read_dir(&dir)
            .await
            .map_err(|e| SwcacheError::store(format!("listing {}", dir.display()), e))?;
        let mut keys = Vec::new();
        while let Some(entry) = listing
            .next_entry()
            .await
            .map_err(|e| SwcacheError::store(format!("listing {}", dir.display()), e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXT) {
                keys.push(Self::read_entry(&path).await?.0.key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use tempfile::TempDir;

    fn key(url: &str) -> RequestKey {
        Request::get(url).unwrap().key()
    }

    fn png(body: &'static [u8]) -> Response {
        Response::new(200, Bytes::from_static(body))
            .with_status_text("OK")
            .with_header("Content-Type", "image/png")
    }

    #[tokio::test]
    async fn survives_new_instance() {
        let temp = TempDir::new().unwrap();
        let k = key("https://app.example/scannerlogo.png");

        DiskStorage::new(temp.path())
            .put("assets-v1", k.clone(), png(b"\x89PNG"))
            .await
            .unwrap();

        let reopened = DiskStorage::new(temp.path());
        let hit = reopened.get("assets-v1", &k).await.unwrap().unwrap();
        assert_eq!(&hit.body[..], b"\x89PNG");
        assert_eq!(hit.status_text, "OK");
        assert_eq!(hit.headers.get("content-type"), Some("image/png"));
        assert_eq!(reopened.entries("assets-v1").await.unwrap(), vec![k]);
    }

    #[tokio::test]
    async fn missing_root_has_no_stores() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().join("absent"));
        assert!(storage.keys().await.unwrap().is_empty());
        assert!(storage
            .get("html-v1", &key("https://app.example/"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn put_all_publishes_every_entry() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        let entries = vec![
            (key("https://app.example/a.png"), png(b"a")),
            (key("https://app.example/manifest.json"), Response::new(200, "{}")),
        ];

        storage.put_all("assets-v2", entries).await.unwrap();

        assert_eq!(storage.entries("assets-v2").await.unwrap().len(), 2);
        // staging directories never show up as stores
        assert_eq!(storage.keys().await.unwrap(), vec!["assets-v2"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        storage.open("html-v1").await.unwrap();

        assert!(storage.delete("html-v1").await.unwrap());
        assert!(!storage.delete("html-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_metadata_is_reported() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        let k = key("https://app.example/");
        storage.put("html-v1", k.clone(), Response::new(200, "x")).await.unwrap();

        let meta = temp
            .path()
            .join("html-v1")
            .join(DiskStorage::entry_file(&k));
        std::fs::write(&meta, b"not json").unwrap();

        assert!(matches!(
            storage.get("html-v1", &k).await.unwrap_err(),
            SwcacheError::EntryCorrupt { .. }
        ));
    }

    #[tokio::test]
    async fn put_all_collapses_repeated_keys() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        let entries = vec![
            (key("https://app.example/a.png"), png(b"first")),
            (key("https://app.example/b.js"), Response::new(200, "js")),
            (key("https://app.example/a.png"), png(b"second")),
        ];

        storage.put_all("assets-v2", entries).await.unwrap();

        assert_eq!(storage.entries("assets-v2").await.unwrap().len(), 2);
        let hit = storage
            .get("assets-v2", &key("https://app.example/a.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&hit.body[..], b"second");
        assert_eq!(root_listing(&temp), vec!["assets-v2"]);
    }

    #[tokio::test]
    async fn put_all_into_existing_store_keeps_other_entries() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        storage
            .put("assets-v2", key("https://app.example/old.png"), png(b"old"))
            .await
            .unwrap();

        storage
            .put_all("assets-v2", vec![(key("https://app.example/new.png"), png(b"new"))])
            .await
            .unwrap();

        assert_eq!(storage.entries("assets-v2").await.unwrap().len(), 2);
        assert_eq!(root_listing(&temp), vec!["assets-v2"]);
    }

    #[tokio::test]
    async fn failed_put_all_leaves_no_staging_behind() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        // a plain file where the store directory should be
        std::fs::write(temp.path().join("assets-v2"), b"").unwrap();

        let entries = vec![
            (key("https://app.example/a.png"), png(b"a")),
            (key("https://app.example/b.js"), Response::new(200, "js")),
        ];
        assert!(storage.put_all("assets-v2", entries).await.is_err());

        assert_eq!(root_listing(&temp), vec!["assets-v2"]);
        assert!(temp.path().join("assets-v2").is_file());
    }

    #[tokio::test]
    async fn concurrent_puts_keep_one_whole_response() {
        let temp = TempDir::new().unwrap();
        let storage = std::sync::Arc::new(DiskStorage::new(temp.path()));
        let k = key("https://app.example/a.png");

        let writers = (0..16).map(|i| {
            let storage = storage.clone();
            let k = k.clone();
            tokio::spawn(async move {
                let response = Response::new(200, format!("body-{}", i))
                    .with_header("X-Writer", i.to_string());
                storage.put("assets-v1", k, response).await
            })
        });
        for writer in futures_util::future::join_all(writers).await {
            writer.unwrap().unwrap();
        }

        let hit = storage.get("assets-v1", &k).await.unwrap().unwrap();
        let writer = hit.headers.get("x-writer").unwrap();
        assert_eq!(hit.body, Bytes::from(format!("body-{}", writer)));
        assert_eq!(storage.entries("assets-v1").await.unwrap(), vec![k]);
    }

    #[test]
    fn truncated_entry_is_corrupt() {
        let path = Path::new("x.entry");
        assert!(matches!(
            decode_entry(path, Bytes::from_static(b"\x00\x00")),
            Err(SwcacheError::EntryCorrupt { .. })
        ));
        assert!(matches!(
            decode_entry(path, Bytes::from_static(b"\x00\x00\x00\xffabc")),
            Err(SwcacheError::EntryCorrupt { .. })
        ));
    }

    fn root_listing(temp: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}
