//! Redis cache backend
//!
//! Holds one multiplexed connection opened by `init`. Every remote call is
//! bounded by the configured timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::info;

use super::{CacheBackend, CacheError};

enum State {
    Uninit,
    Open(MultiplexedConnection),
    Closed,
}

// == Redis Cache ==
/// Cache backend talking to a Redis server.
pub struct RedisCache {
    client: redis::Client,
    state: RwLock<State>,
    timeout: Duration,
}

impl RedisCache {
    /// Parses `url` without connecting. Call `init` before use.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            state: RwLock::new(State::Uninit),
            timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        match &*self.state.read().await {
            State::Open(conn) => Ok(conn.clone()),
            _ => Err(CacheError::NotConnected),
        }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match timeout(self.timeout, op).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn init(&self) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        if !matches!(*state, State::Uninit) {
            return Err(CacheError::AlreadyInitialized);
        }

        let conn = self
            .bounded(self.client.get_multiplexed_async_connection())
            .await?;
        *state = State::Open(conn);

        info!(
            "Connected to Redis at {}",
            self.client.get_connection_info().addr
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        self.bounded(conn.set_ex::<_, _, ()>(key, value, seconds))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.del::<_, ()>(key)).await
    }

    async fn close(&self) -> Result<(), CacheError> {
        let mut state = self.state.write().await;
        match std::mem::replace(&mut *state, State::Closed) {
            State::Open(conn) => {
                drop(conn);
                info!("Redis connection closed");
                Ok(())
            }
            _ => Err(CacheError::NotConnected),
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
