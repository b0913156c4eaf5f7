//! Core types and shared functionality for showroom.
//!
//! This crate provides:
//! - Named response caches and a local key-value store with SQLite backend
//! - Unified error types
//! - Configuration structures
//! - The overlay priority stack, a library-only surface for page hosts

pub mod cache;
pub mod config;
pub mod error;
pub mod overlay;

pub use cache::{CacheDb, CacheSummary, CachedResponse, FAVORITES_QUEUE_KEY};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use overlay::OverlayStack;
