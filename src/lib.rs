//! swcache - versioned offline cache manager
//!
//! Intercepts the requests of a web application, answers HTML navigations
//! network-first and every other resource cache-first, and keeps exactly
//! one generation of cache stores per deployed version.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod journal;
pub mod lifecycle;
pub mod network;
pub mod routing;
pub mod store;
pub mod ui;
pub mod version;

pub use error::{SwcacheError, SwcacheResult};
