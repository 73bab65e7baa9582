//! Static asset manifest
//!
//! The list of URLs pre-cached at install. Entries may be relative; they
//! are resolved against the scope URL of the application.

use crate::error::{SwcacheError, SwcacheResult};
use url::Url;

/// Assets of the stock deployment (no `index.html`: HTML is network-first)
pub const DEFAULT_ENTRIES: [&str; 4] = [
    "./scannerlogo.png",
    "./manifest.json",
    "https://cdn.jsdelivr.net/npm/@ericblade/quagga2@1.8.1/dist/quagga.min.js",
    "https://cdn.jsdelivr.net/npm/zxing-wasm@2/dist/iife/reader/index.js",
];

/// Ordered list of URLs known at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAssetManifest {
    entries: Vec<String>,
}

impl StaticAssetManifest {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every entry against `scope`, keeping manifest order
    pub fn resolve(&self, scope: &Url) -> SwcacheResult<Vec<Url>> {
        self.entries
            .iter()
            .map(|entry| {
                scope.join(entry).map_err(|e| SwcacheError::UrlInvalid {
                    url: entry.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

impl Default for StaticAssetManifest {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRIES.iter().map(|s| s.to_string()).collect())
    }
}
