//! Request routing
//!
//! Every intercepted request is classified and then served by one of three
//! strategies:
//!
//! | Category | Strategy | Store | Offline fallback |
//! |----------|----------|-------|------------------|
//! | HTML navigation | network-first, HTTP caches bypassed | HTML | 503 `Offline` |
//! | Image | cache-first, hardening headers on hits | assets | 503 `Offline image` |
//! | Generic | cache-first | assets | 503 `Offline asset` |
//!
//! Network failures never escape: they turn into a cache fallback or a
//! synthetic response. Store failures do escape, there is nothing sensible
//! to serve when the store itself is gone.

use crate::classify::{classify, Category};
use crate::error::SwcacheResult;
use crate::http::{Headers, Request, Response};
use crate::network::{FetchOptions, Fetcher};
use crate::store::CacheStorage;
use crate::version::StoreNames;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// One year, in seconds
const IMAGE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// Headers laid over cached images when they are served
pub fn hardening_headers() -> Headers {
    [
        (
            "Cache-Control",
            format!("public, max-age={}", IMAGE_MAX_AGE_SECS),
        ),
        ("X-Content-Type-Options", "nosniff".to_string()),
        ("X-Frame-Options", "DENY".to_string()),
        ("X-XSS-Protection", "1; mode=block".to_string()),
    ]
    .into_iter()
    .collect()
}

/// Synthetic responses served when neither network nor cache can answer
pub mod offline {
    use crate::http::Response;

    pub fn html() -> Response {
        Response::text(503, "Offline", "Offline")
    }

    pub fn image() -> Response {
        Response::text(503, "", "Offline image")
    }

    pub fn asset() -> Response {
        Response::text(503, "", "Offline asset")
    }
}

/// Where a routed response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Network,
    Cache,
    Offline,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// A response together with how it was produced
#[derive(Debug, Clone)]
pub struct Routed {
    pub category: Category,
    pub source: Source,
    pub response: Response,
}

impl Routed {
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Routes requests for one active version
pub struct Router {
    names: StoreNames,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
}

impl Router {
    pub fn new(names: StoreNames, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            names,
            storage,
            fetcher,
        }
    }

    pub fn store_names(&self) -> &StoreNames {
        &self.names
    }

    /// Produce the response for a request
    pub async fn route(&self, request: &Request) -> SwcacheResult<Response> {
        Ok(self.dispatch(request).await?.into_response())
    }

    /// Produce the response and report how it was obtained
    pub async fn dispatch(&self, request: &Request) -> SwcacheResult<Routed> {
        let category = classify(request);
        let (source, response) = match category {
            Category::HtmlNavigation => self.network_first(request).await?,
            Category::Image => self.cache_first(request, category).await?,
            Category::Generic => self.cache_first(request, category).await?,
        };

        debug!(
            url = %request.url(),
            %category,
            %source,
            status = response.status,
            "routed"
        );
        Ok(Routed {
            category,
            source,
            response,
        })
    }

    async fn network_first(&self, request: &Request) -> SwcacheResult<(Source, Response)> {
        match self.fetcher.fetch(request, FetchOptions::no_store()).await {
            Ok(fresh) => {
                self.store_copy(&self.names.html, request, &fresh).await?;
                Ok((Source::Network, fresh))
            }
            Err(e) => {
                warn!("Navigation fetch failed, trying cache: {}", e);
                match self.lookup(&self.names.html, request).await? {
                    Some(cached) => Ok((Source::Cache, cached)),
                    None => Ok((Source::Offline, offline::html())),
                }
            }
        }
    }

    async fn cache_first(
        &self,
        request: &Request,
        category: Category,
    ) -> SwcacheResult<(Source, Response)> {
        if let Some(cached) = self.lookup(&self.names.assets, request).await? {
            let served = if category == Category::Image {
                harden(cached)
            } else {
                cached
            };
            return Ok((Source::Cache, served));
        }

        match self.fetcher.fetch(request, FetchOptions::default()).await {
            Ok(fresh) => {
                self.store_copy(&self.names.assets, request, &fresh).await?;
                Ok((Source::Network, fresh))
            }
            Err(e) => {
                warn!("Asset fetch failed: {}", e);
                let fallback = if category == Category::Image {
                    offline::image()
                } else {
                    offline::asset()
                };
                Ok((Source::Offline, fallback))
            }
        }
    }

    async fn lookup(&self, store: &str, request: &Request) -> SwcacheResult<Option<Response>> {
        if !request.is_cacheable() {
            return Ok(None);
        }
        self.storage.get(store, &request.key()).await
    }

    async fn store_copy(&self, store: &str, request: &Request, response: &Response) -> SwcacheResult<()> {
        if !request.is_cacheable() || !response.is_storable() {
            debug!(url = %request.url(), status = response.status, "not storing");
            return Ok(());
        }
        self.storage
            .put(store, request.key(), response.clone())
            .await
    }
}

/// Serve-time copy of a cached image with the hardening headers applied
fn harden(mut cached: Response) -> Response {
    cached.headers.merge(&hardening_headers());
    cached
}
