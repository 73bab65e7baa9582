//! Build identifiers and the cache store names derived from them
//!
//! Every deployment carries a distinct [`VersionTag`]. The HTML and asset
//! stores are named after it, so a new deployment always starts with
//! fresh, empty stores and the previous generation can be told apart and
//! collected at activation.

use crate::error::{SwcacheError, SwcacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of the store holding navigation responses
pub const HTML_STORE_PREFIX: &str = "html-";

/// Prefix of the store holding static assets and images
pub const ASSET_STORE_PREFIX: &str = "assets-";

/// Check that a name can be used as a cache store name.
///
/// Store names double as directory names for the on-disk backend, so path
/// separators, whitespace and dot-prefixed names are rejected.
pub fn validate_store_name(name: &str) -> SwcacheResult<()> {
    let invalid = |reason: &str| SwcacheError::StoreNameInvalid {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.starts_with('.') {
        return Err(invalid("name must not start with '.'"));
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(invalid(
            "name must not contain path separators, whitespace or control characters",
        ));
    }
    Ok(())
}

/// Opaque per-deployment build identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> SwcacheResult<Self> {
        let tag = tag.into();
        validate_store_name(&tag).map_err(|e| match e {
            SwcacheError::StoreNameInvalid { reason, .. } => SwcacheError::VersionTagInvalid {
                tag: tag.clone(),
                reason,
            },
            other => other,
        })?;
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store names for this version
    pub fn store_names(&self) -> StoreNames {
        StoreNames {
            html: format!("{}{}", HTML_STORE_PREFIX, self.0),
            assets: format!("{}{}", ASSET_STORE_PREFIX, self.0),
        }
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VersionTag {
    type Err = SwcacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VersionTag {
    type Error = SwcacheError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.0
    }
}

/// The pair of store names owned by one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    /// Network-first store for HTML navigations
    pub html: String,
    /// Cache-first store for images and other static assets
    pub assets: String,
}

impl StoreNames {
    /// Whether `name` belongs to this generation.
    ///
    /// Exact match only; `html-v1-old` is not kept for version `v1`.
    pub fn contains(&self, name: &str) -> bool {
        name == self.html || name == self.assets
    }

    pub fn as_array(&self) -> [&str; 2] {
        [&self.html, &self.assets]
    }
}
