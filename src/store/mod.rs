//! Named cache stores
//!
//! A cache store maps a normalized request identity to a stored response.
//! Stores are created on first use, entries are overwritten on re-put and
//! never expire individually. Deleting a whole store is the only eviction.
//!
//! # Backends
//!
//! | Backend | Persistence | Used by |
//! |---------|-------------|---------|
//! | [`MemoryStorage`] | process lifetime | tests, embedding hosts |
//! | [`DiskStorage`] | directory per store | the `swcache` binary |

pub mod disk;
pub mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::error::SwcacheResult;
use crate::http::{RequestKey, Response};
use async_trait::async_trait;

/// Storage holding every named cache store of one origin
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it empty if it does not exist
    async fn open(&self, name: &str) -> SwcacheResult<()>;

    /// Check whether a store exists
    async fn has(&self, name: &str) -> SwcacheResult<bool>;

    /// Look up an entry. A missing store is a miss, not an error.
    async fn get(&self, name: &str, key: &RequestKey) -> SwcacheResult<Option<Response>>;

    /// Insert or overwrite an entry, creating the store if needed
    async fn put(&self, name: &str, key: RequestKey, response: Response) -> SwcacheResult<()>;

    /// Insert a batch of entries so that either all or none become visible
    async fn put_all(&self, name: &str, entries: Vec<(RequestKey, Response)>)
        -> SwcacheResult<()>;

    /// Names of all existing stores, sorted
    async fn keys(&self) -> SwcacheResult<Vec<String>>;

    /// Delete a whole store. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> SwcacheResult<bool>;

    /// Keys of all entries in a store, sorted
    async fn entries(&self, name: &str) -> SwcacheResult<Vec<RequestKey>>;
}
