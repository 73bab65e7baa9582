//! Request and response records
//!
//! These are deliberately small: the router only needs method, URL, mode,
//! destination and a handful of headers on the way in, and status, headers
//! and body bytes on the way out.

use crate::error::{SwcacheError, SwcacheResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Content type the platform assigns to responses built from a string
pub const TEXT_PLAIN_UTF8: &str = "text/plain;charset=UTF-8";

/// Header map with case-insensitive names.
///
/// Names are stored lower-cased. `insert` replaces an earlier value;
/// `append` (and collecting from an iterator) combines repeated fields
/// into one comma-separated value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Add a value, joining it onto an existing field with `, `
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let value = value.into();
        self.0
            .entry(name.as_ref().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.clone());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    /// Copy every header of `overrides` into `self`, replacing same-named ones
    pub fn merge(&mut self, overrides: &Headers) {
        for (name, value) in overrides.iter() {
            self.insert(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// Request mode as reported by the browsing context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page load
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

impl FromStr for RequestMode {
    type Err = SwcacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigate" => Ok(Self::Navigate),
            "same-origin" => Ok(Self::SameOrigin),
            "no-cors" => Ok(Self::NoCors),
            "cors" => Ok(Self::Cors),
            other => Err(SwcacheError::RequestInvalid(format!(
                "unknown request mode '{}'. Valid modes: navigate, same-origin, no-cors, cors",
                other
            ))),
        }
    }
}

/// Destination hint of a request (what the response will be used for)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Empty,
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    Other(String),
}

impl FromStr for Destination {
    type Err = SwcacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "" | "empty" => Self::Empty,
            "document" => Self::Document,
            "image" => Self::Image,
            "script" => Self::Script,
            "style" => Self::Style,
            "font" => Self::Font,
            "manifest" => Self::Manifest,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Identity of a request inside a cache store.
///
/// Method plus URL without fragment; headers never take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    url: Url,
    mode: RequestMode,
    destination: Destination,
    headers: Headers,
}

impl Request {
    /// Build a request for an absolute URL
    pub fn new(method: &str, url: &str) -> SwcacheResult<Self> {
        let url = Url::parse(url).map_err(|e| SwcacheError::UrlInvalid {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(method, url)
    }

    pub fn get(url: &str) -> SwcacheResult<Self> {
        Self::new("GET", url)
    }

    pub fn from_url(method: &str, url: Url) -> SwcacheResult<Self> {
        let method = method.trim().to_ascii_uppercase();
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SwcacheError::RequestInvalid(format!(
                "invalid method '{}'",
                method
            )));
        }
        Ok(Self {
            method,
            url,
            mode: RequestMode::default(),
            destination: Destination::default(),
            headers: Headers::new(),
        })
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_accept(self, accept: impl Into<String>) -> Self {
        self.with_header("accept", accept)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn accept(&self) -> Option<&str> {
        self.headers.get("accept")
    }

    /// Only GET requests may be written to a store
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    /// Normalized identity used as the store key
    pub fn key(&self) -> RequestKey {
        let mut url = self.url.clone();
        url.set_fragment(None);
        RequestKey {
            method: self.method.clone(),
            url: url.into(),
        }
    }
}

/// A response produced by the network, a store, or synthesized locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
    /// Cross-origin response whose contents are not inspectable
    pub opaque: bool,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Headers::new(),
            body: body.into(),
            opaque: false,
        }
    }

    /// Locally constructed text response
    pub fn text(status: u16, status_text: &str, body: &'static str) -> Self {
        let mut response = Self::new(status, Bytes::from_static(body.as_bytes()));
        response.status_text = status_text.to_string();
        response.headers.insert("content-type", TEXT_PLAIN_UTF8);
        response
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Status in the 200-299 range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether a store accepts this response.
    ///
    /// Partial content and `Vary: *` responses cannot be replayed for a
    /// later request, so they are served but never stored.
    pub fn is_storable(&self) -> bool {
        if self.status == 206 {
            return false;
        }
        !self
            .headers
            .get("vary")
            .map(|v| v.split(',').any(|part| part.trim() == "*"))
            .unwrap_or(false)
    }
}
