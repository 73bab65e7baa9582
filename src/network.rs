//! Outbound network access
//!
//! The router and lifecycle only see the [`Fetcher`] trait. [`HttpFetcher`]
//! is the production implementation on top of a blocking `ureq` agent,
//! driven from tokio's blocking pool.

use crate::config::schema::NetworkConfig;
use crate::error::NetworkError;
use crate::http::{Headers, Request, Response};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;

/// How a fetch interacts with intermediate HTTP caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Normal HTTP caching rules
    #[default]
    Default,
    /// Bypass every HTTP cache layer and force revalidation at the origin
    NoStore,
}

/// Per-fetch options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub cache: CacheMode,
}

impl FetchOptions {
    pub fn no_store() -> Self {
        Self {
            cache: CacheMode::NoStore,
        }
    }
}

/// Abstract outbound fetch
///
/// Resolves with any response the transport delivered, including 4xx and
/// 5xx. Fails only when no response could be obtained.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request, options: FetchOptions)
        -> Result<Response, NetworkError>;
}

/// Fetcher backed by a real HTTP client
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    max_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &NetworkConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout_secs.map(Duration::from_secs))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            user_agent: config.user_agent.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn fetch_blocking(&self, request: &Request, options: FetchOptions) -> Result<Response, NetworkError> {
        let url = request.url().as_str();
        let failed = |reason: String| NetworkError::new(url, reason);

        let mut builder = ureq::http::Request::builder()
            .method(request.method())
            .uri(url)
            .header("user-agent", &self.user_agent);
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if options.cache == CacheMode::NoStore {
            builder = builder
                .header("cache-control", "no-cache")
                .header("pragma", "no-cache");
        }
        let http_request = builder.body(()).map_err(|e| failed(e.to_string()))?;

        let mut response = self
            .agent
            .run(http_request)
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        let headers = collect_headers(response.headers());
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()
            .map_err(|e| failed(format!("reading body: {}", e)))?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body: Bytes::from(body),
            opaque: false,
        })
    }
}

/// Convert transport headers, joining repeated fields and skipping values
/// that are not visible ASCII
fn collect_headers(map: &ureq::http::HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
        .collect()
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        request: &Request,
        options: FetchOptions,
    ) -> Result<Response, NetworkError> {
        let this = self.clone();
        let owned = request.clone();
        let url = request.url().to_string();

        debug!(method = request.method(), url = %url, ?options, "fetch");
        tokio::task::spawn_blocking(move || this.fetch_blocking(&owned, options))
            .await
            .map_err(|e| NetworkError::new(url, format!("fetch task failed: {}", e)))?
    }
}
