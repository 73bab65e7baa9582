//! Open client contexts (pages, tabs) and which version controls them

use crate::version::VersionTag;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One open browsing context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: Uuid,
    pub url: String,
    /// Version currently intercepting this client's requests
    pub controller: Option<VersionTag>,
}

/// Shared registry of open clients
#[derive(Debug, Clone, Default)]
pub struct Clients {
    inner: Arc<RwLock<HashMap<Uuid, Client>>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client controlled by `controller` (or by nothing)
    pub async fn open(&self, url: impl Into<String>, controller: Option<VersionTag>) -> Uuid {
        let id = Uuid::new_v4();
        let client = Client {
            id,
            url: url.into(),
            controller,
        };
        self.inner.write().await.insert(id, client);
        id
    }

    pub async fn close(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    pub async fn get(&self, id: Uuid) -> Option<Client> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Number of clients controlled by a version other than `version`
    pub async fn controlled_by_other(&self, version: &VersionTag) -> usize {
        self.inner
            .read()
            .await
            .values()
            .filter(|c| c.controller.as_ref().is_some_and(|v| v != version))
            .count()
    }

    /// Make `version` the controller of every open client without waiting
    /// for navigations. Returns the number of clients claimed.
    pub async fn claim(&self, version: &VersionTag) -> usize {
        let mut clients = self.inner.write().await;
        for client in clients.values_mut() {
            client.controller = Some(version.clone());
        }
        clients.len()
    }
}
