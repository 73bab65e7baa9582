//! Error types for swcache
//!
//! All modules use `SwcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for swcache operations
pub type SwcacheResult<T> = Result<T, SwcacheError>;

/// A failed outbound fetch.
///
/// Only transport-level failures end up here. An HTTP error status is a
/// delivered response, not a network error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("network request to {url} failed: {reason}")]
pub struct NetworkError {
    pub url: String,
    pub reason: String,
}

impl NetworkError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// All errors that can occur in swcache
#[derive(Error, Debug)]
pub enum SwcacheError {
    // Network errors
    #[error(transparent)]
    Network(#[from] NetworkError),

    // Lifecycle errors
    #[error("Failed to populate asset store from manifest entry {url}: {reason}")]
    ManifestPopulation { url: String, reason: String },

    #[error("Invalid version tag '{tag}': {reason}")]
    VersionTagInvalid { tag: String, reason: String },

    #[error("Cannot {action} while worker is {state}")]
    InvalidTransition { action: String, state: String },

    #[error("Invalid control message: {0}")]
    MessageInvalid(String),

    // Request errors
    #[error("Invalid URL '{url}': {reason}")]
    UrlInvalid { url: String, reason: String },

    #[error("Invalid request: {0}")]
    RequestInvalid(String),

    // Store errors
    #[error("Invalid cache store name '{name}': {reason}")]
    StoreNameInvalid { name: String, reason: String },

    #[error("Cache store not found: {0}")]
    StoreNotFound(String),

    #[error("Cache store unavailable: {context}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry {path}: {reason}")]
    EntryCorrupt { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl SwcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a store error with context
    pub fn store(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::StoreUnavailable {
            context: context.into(),
            source,
        }
    }

    /// Create a manifest population error
    pub fn manifest(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ManifestPopulation {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// A failed install leaves the previous generation in place, so the
    /// next attempt starts from a clean slate.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ManifestPopulation { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestPopulation { .. } => {
                Some("The previous version stays active. Check connectivity and run: swcache install")
            }
            Self::InvalidTransition { .. } => Some("Run: swcache install"),
            Self::MessageInvalid(_) => Some(r#"Expected JSON such as {"type":"SKIP_WAITING"}"#),
            Self::StoreUnavailable { .. } => Some("Check storage.dir in: swcache config show"),
            Self::ConfigInvalid { .. } => Some("Regenerate defaults with: swcache config init --force"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SwcacheError::manifest("https://cdn.example/app.js", "status 404");
        assert!(err
            .to_string()
            .contains("Failed to populate asset store from manifest entry https://cdn.example/app.js"));
    }

    #[test]
    fn network_error_converts() {
        let err: SwcacheError = NetworkError::new("https://a.example/", "connection refused").into();
        assert!(matches!(err, SwcacheError::Network(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn error_hint() {
        let err = SwcacheError::MessageInvalid("missing type".to_string());
        assert!(err.hint().unwrap().contains("SKIP_WAITING"));
        assert_eq!(SwcacheError::User("x".to_string()).hint(), None);
    }

    #[test]
    fn error_retryable() {
        assert!(SwcacheError::manifest("u", "r").is_retryable());
        assert!(!SwcacheError::StoreNotFound("html-v1".to_string()).is_retryable());
    }
}
