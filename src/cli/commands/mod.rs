//! CLI command implementations

pub mod activate;
pub mod config;
pub mod fetch;
pub mod install;
pub mod message;
pub mod status;
pub mod stores;

pub use activate::execute as activate;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use message::execute as message;
pub use status::execute as status;
pub use stores::execute as stores;

use crate::config::Config;
use crate::error::SwcacheResult;
use crate::journal::Journal;
use crate::lifecycle::{LifecycleManager, Registration};
use crate::network::HttpFetcher;
use crate::store::DiskStorage;
use crate::version::VersionTag;
use std::path::PathBuf;
use std::sync::Arc;

/// Collaborators shared by every command that touches the stores
pub(crate) struct Workspace {
    pub storage: Arc<DiskStorage>,
    pub fetcher: Arc<HttpFetcher>,
    pub registration_path: PathBuf,
    pub journal: Journal,
}

impl Workspace {
    pub fn new(config: &Config) -> Self {
        let root = config.storage_dir();
        Self {
            registration_path: Registration::path_in(&root),
            storage: Arc::new(DiskStorage::new(root)),
            fetcher: Arc::new(HttpFetcher::new(&config.network)),
            journal: Journal::new(config),
        }
    }

    pub async fn registration(&self) -> SwcacheResult<Registration> {
        Registration::load(&self.registration_path).await
    }

    pub async fn save_registration(&self, registration: &Registration) -> SwcacheResult<()> {
        registration.save(&self.registration_path).await
    }

    /// Lifecycle manager for `version` over the on-disk stores
    pub fn manager(&self, config: &Config, version: VersionTag) -> SwcacheResult<LifecycleManager> {
        Ok(LifecycleManager::new(
            version,
            &config.static_manifest(),
            &config.scope_url()?,
            self.storage.clone(),
            self.fetcher.clone(),
        )?
        .with_journal(self.journal.clone()))
    }
}
