//! Cache Module
//!
//! Key-value cache with per-entry TTL behind the `CacheBackend` trait. Redis is
//! the production backend; the in-memory backend serves tests and single-node
//! deployments without a cache server.

mod entry;
mod memory;
mod redis_cache;
mod stats;


use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use stats::{CacheStats, CacheStatsSnapshot};

// == Public Constants ==
/// Cache key of the full student listing
pub const STUDENTS_LIST_KEY: &str = "students_list";

/// Default lifetime of the cached listing (12 hours)
pub const DEFAULT_LIST_TTL_SECS: u64 = 43_200;

// == Cache Error ==
/// Failures raised by a cache backend.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `init` has not run yet, or `close` already ran
    #[error("Cache is not connected")]
    NotConnected,

    /// `init` was called a second time
    #[error("Cache is already initialized")]
    AlreadyInitialized,

    /// The remote call did not finish in time
    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// Redis reported an error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

// == Cache Backend ==
/// Connection-scoped string cache.
///
/// Lifecycle: `init` exactly once, then any number of `get`/`set`/`delete`,
/// then `close` exactly once.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Establishes the connection.
    async fn init(&self) -> Result<(), CacheError>;

    /// Returns the value under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value, for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Releases the connection.
    async fn close(&self) -> Result<(), CacheError>;

    /// Short backend name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}
