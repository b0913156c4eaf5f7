//! SQLite-backed storage for named response caches and the local store.
//!
//! This module provides the persistent side of the offline cache controller
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Version-tagged named caches (`v1-static`, `v1-images`, ...)
//! - Request-keyed response snapshots, overwritten on every store
//! - Cascading deletion of a cache and all of its entries
//! - A string-keyed local store holding the favorites sync queue
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod names;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use names::CacheSummary;
pub use store::FAVORITES_QUEUE_KEY;
