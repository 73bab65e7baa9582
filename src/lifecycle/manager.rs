//! Lifecycle manager for one version

use crate::error::{SwcacheError, SwcacheResult};
use crate::http::{Request, RequestKey, Response};
use crate::journal::Journal;
use crate::lifecycle::clients::Clients;
use crate::lifecycle::manifest::StaticAssetManifest;
use crate::lifecycle::message::ControlMessage;
use crate::lifecycle::state::WorkerState;
use crate::network::{FetchOptions, Fetcher};
use crate::routing::Router;
use crate::store::CacheStorage;
use crate::version::{StoreNames, VersionTag};
use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of a successful install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub store: String,
    pub entries: usize,
}

/// Outcome of a successful activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub version: String,
    /// Stores removed by this run
    pub deleted: Vec<String>,
    /// Stores left in place (the current generation)
    pub kept: Vec<String>,
    /// Clients now controlled by this version
    pub claimed: usize,
}

/// Install followed by activation when allowed
#[derive(Debug, Clone)]
pub struct Transition {
    pub install: InstallReport,
    /// `None` when the version is left waiting
    pub activation: Option<ActivationReport>,
}

/// Drives install and activation of one version
pub struct LifecycleManager {
    version: VersionTag,
    names: StoreNames,
    manifest: Vec<Url>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    clients: Clients,
    journal: Journal,
    state: WorkerState,
    skip_waiting: bool,
}

impl LifecycleManager {
    /// Create a manager for `version`, resolving the manifest against `scope`
    pub fn new(
        version: VersionTag,
        manifest: &StaticAssetManifest,
        scope: &Url,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> SwcacheResult<Self> {
        Ok(Self {
            names: version.store_names(),
            version,
            manifest: manifest.resolve(scope)?,
            storage,
            fetcher,
            clients: Clients::new(),
            journal: Journal::disabled(),
            state: WorkerState::Parsed,
            skip_waiting: false,
        })
    }

    /// Share a client registry with other versions
    pub fn with_clients(mut self, clients: Clients) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Rebuild a manager for a version whose install already completed in
    /// an earlier run
    pub fn resume_installed(mut self) -> Self {
        self.state = WorkerState::Installed;
        self
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    pub fn store_names(&self) -> &StoreNames {
        &self.names
    }

    /// Resolved manifest URLs, in manifest order
    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Skip the waiting phase: activate as soon as install completes
    pub fn skip_waiting(&mut self) {
        if !self.skip_waiting {
            debug!(version = %self.version, "skip waiting requested");
        }
        self.skip_waiting = true;
    }

    /// Apply a control message. Returns true if it was acted upon.
    pub fn handle_message(&mut self, message: &ControlMessage) -> bool {
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting();
                true
            }
            ControlMessage::Other(kind) => {
                debug!(?kind, "ignoring control message");
                false
            }
        }
    }

    /// Whether an installed version may activate now: either waiting was
    /// skipped or no client is held by an older version
    pub async fn ready_to_activate(&self) -> bool {
        self.state == WorkerState::Installed
            && (self.skip_waiting || self.clients.controlled_by_other(&self.version).await == 0)
    }

    pub async fn install(&mut self) -> SwcacheResult<InstallReport> {
        self.install_with_progress(&|_| {}).await
    }

    /// Populate the asset store from the manifest.
    ///
    /// All entries are fetched before anything is written; one failed
    /// fetch or one non-2xx response fails the install and leaves every
    /// store untouched. `on_fetched` is called once per fetched entry.
    pub async fn install_with_progress(
        &mut self,
        on_fetched: &(dyn Fn(&Url) + Send + Sync),
    ) -> SwcacheResult<InstallReport> {
        if self.state != WorkerState::Parsed {
            return Err(self.invalid("install"));
        }

        self.state = WorkerState::Installing;
        self.skip_waiting();
        info!(version = %self.version, entries = self.manifest.len(), "installing");

        let populated = self.populate(on_fetched).await;
        match populated {
            Ok(entries) => {
                self.state = WorkerState::Installed;
                let report = InstallReport {
                    version: self.version.to_string(),
                    store: self.names.assets.clone(),
                    entries,
                };
                self.journal
                    .record("install.completed", &serde_json::json!(report))
                    .await;
                info!(version = %self.version, entries, "installed");
                Ok(report)
            }
            Err(e) => {
                self.state = WorkerState::Redundant;
                warn!(version = %self.version, "install failed: {}", e);
                self.journal
                    .record(
                        "install.failed",
                        &serde_json::json!({
                            "version": self.version.as_str(),
                            "error": e.to_string(),
                        }),
                    )
                    .await;
                Err(e)
            }
        }
    }

    async fn populate(&self, on_fetched: &(dyn Fn(&Url) + Send + Sync)) -> SwcacheResult<usize> {
        let fetches = self.manifest.iter().map(|url| async move {
            let request = Request::from_url("GET", url.clone())?;
            let response = self
                .fetcher
                .fetch(&request, FetchOptions::default())
                .await
                .map_err(|e| SwcacheError::manifest(url.as_str(), e.reason))?;
            if !response.ok() {
                return Err(SwcacheError::manifest(
                    url.as_str(),
                    format!("bad status {}", response.status),
                ));
            }
            on_fetched(url);
            Ok::<(RequestKey, Response), SwcacheError>((request.key(), response))
        });

        let entries = try_join_all(fetches).await?;
        // Two manifest entries may resolve to the same URL
        let count = entries
            .iter()
            .map(|(key, _)| key)
            .collect::<HashSet<_>>()
            .len();
        self.storage.open(&self.names.assets).await?;
        self.storage.put_all(&self.names.assets, entries).await?;
        Ok(count)
    }

    /// Claim clients and delete every store of other generations.
    ///
    /// Allowed after install and again after a previous activation; a
    /// repeated run deletes nothing new.
    pub async fn activate(&mut self) -> SwcacheResult<ActivationReport> {
        if !self.state.can_activate() {
            return Err(self.invalid("activate"));
        }

        let previous = self.state;
        self.state = WorkerState::Activating;
        let claimed = self.clients.claim(&self.version).await;

        let collected = self.collect_stale().await;
        match collected {
            Ok((deleted, kept)) => {
                self.state = WorkerState::Activated;
                let report = ActivationReport {
                    version: self.version.to_string(),
                    deleted,
                    kept,
                    claimed,
                };
                self.journal
                    .record("activate.completed", &serde_json::json!(report))
                    .await;
                info!(
                    version = %self.version,
                    deleted = report.deleted.len(),
                    claimed,
                    "activated"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = previous;
                Err(e)
            }
        }
    }

    async fn collect_stale(&self) -> SwcacheResult<(Vec<String>, Vec<String>)> {
        let (kept, stale): (Vec<String>, Vec<String>) = self
            .storage
            .keys()
            .await?
            .into_iter()
            .partition(|name| self.names.contains(name));

        let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;
        let mut deleted = Vec::new();
        for (name, result) in stale.into_iter().zip(results) {
            if result? {
                debug!(store = %name, "deleted stale store");
                deleted.push(name);
            }
        }
        Ok((deleted, kept))
    }

    /// Install, then activate if nothing makes the version wait
    pub async fn transition(
        &mut self,
        on_fetched: &(dyn Fn(&Url) + Send + Sync),
    ) -> SwcacheResult<Transition> {
        let install = self.install_with_progress(on_fetched).await?;
        let activation = if self.ready_to_activate().await {
            Some(self.activate().await?)
        } else {
            None
        };
        Ok(Transition {
            install,
            activation,
        })
    }

    /// Router over this version's stores; only an activated version routes
    pub fn router(&self) -> SwcacheResult<Router> {
        if !self.state.is_active() {
            return Err(self.invalid("route requests"));
        }
        Ok(Router::new(
            self.names.clone(),
            self.storage.clone(),
            self.fetcher.clone(),
        ))
    }

    fn invalid(&self, action: &str) -> SwcacheError {
        SwcacheError::InvalidTransition {
            action: action.to_string(),
            state: self.state.to_string(),
        }
    }
}
