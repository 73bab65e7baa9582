//! In-memory cache storage

use crate::error::{SwcacheError, SwcacheResult};
use crate::http::{RequestKey, Response};
use crate::store::CacheStorage;
use crate::version::validate_store_name;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

type Store = HashMap<RequestKey, Response>;

/// Cache storage that lives for the duration of the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<BTreeMap<String, Store>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> SwcacheResult<()> {
        validate_store_name(name)?;
        self.stores
            .write()
            .await
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn has(&self, name: &str) -> SwcacheResult<bool> {
        Ok(self.stores.read().await.contains_key(name))
    }

    async fn get(&self, name: &str, key: &RequestKey) -> SwcacheResult<Option<Response>> {
        Ok(self
            .stores
            .read()
            .await
            .get(name)
            .and_then(|store| store.get(key))
            .cloned())
    }

    async fn put(&self, name: &str, key: RequestKey, response: Response) -> SwcacheResult<()> {
        validate_store_name(name)?;
        debug!(store = name, key = %key, "put");
        self.stores
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(RequestKey, Response)>,
    ) -> SwcacheResult<()> {
        validate_store_name(name)?;
        let mut stores = self.stores.write().await;
        let store = stores.entry(name.to_string()).or_default();
        debug!(store = name, count = entries.len(), "put_all");
        store.extend(entries);
        Ok(())
    }

    async fn keys(&self) -> SwcacheResult<Vec<String>> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> SwcacheResult<bool> {
        Ok(self.stores.write().await.remove(name).is_some())
    }

    async fn entries(&self, name: &str) -> SwcacheResult<Vec<RequestKey>> {
        let stores = self.stores.read().await;
        let store = stores
            .get(name)
            .ok_or_else(|| SwcacheError::StoreNotFound(name.to_string()))?;
        let mut keys: Vec<RequestKey> = store.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
