//! In-memory cache backend
//!
//! HashMap of TTL entries behind an async lock. Expired entries read as absent
//! and are dropped lazily on read or by the periodic sweeper.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheBackend, CacheEntry, CacheError};

#[derive(Debug)]
enum State {
    Uninit,
    Open(HashMap<String, CacheEntry>),
    Closed,
}

// == Memory Cache ==
/// Process-local cache backend with the same lifecycle as the Redis backend.
#[derive(Debug)]
pub struct MemoryCache {
    state: RwLock<State>,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates a cache that still needs `init`.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::Uninit),
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed; zero when not connected.
    pub async fn cleanup_expired(&self) -> usize {
        let mut state = self.state.write().await;
        let State::Open(entries) = &mut *state else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        match &*self.state.read().await {
            State::Open(entries) => entries.len(),
            _ => 0,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn init(&self) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        match *state {
            State::Uninit => {
                *state = State::Open(HashMap::new());
                Ok(())
            }
            _ => Err(CacheError::AlreadyInitialized),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        // Write lock: an expired entry is removed on the spot
        let mut state = self.state.write().await;
        let State::Open(entries) = &mut *state else {
            return Err(CacheError::NotConnected);
        };

        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return Ok(None),
        };

        if expired {
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        let State::Open(entries) = &mut *state else {
            return Err(CacheError::NotConnected);
        };

        // Whole seconds, at least one, as SETEX stores it
        let ttl = Duration::from_secs(ttl.as_secs().max(1));
        entries.insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        let State::Open(entries) = &mut *state else {
            return Err(CacheError::NotConnected);
        };

        entries.remove(key);
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        match std::mem::replace(&mut *state, State::Closed) {
            State::Open(_) => Ok(()),
            _ => Err(CacheError::NotConnected),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
