//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_LIST_TTL_SECS;

/// Which cache backend the listing goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackendKind::Redis),
            "memory" => Ok(CacheBackendKind::Memory),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// SQLite database file
    pub database_path: String,
    /// Cache backend selection
    pub cache_backend: CacheBackendKind,
    /// Redis connection URL
    pub redis_url: String,
    /// Lifetime of the cached student listing in seconds
    pub cache_ttl: u64,
    /// Timeout for a single Redis call in milliseconds
    pub cache_timeout_ms: u64,
    /// Session lifetime in seconds
    pub session_ttl: u64,
    /// In-memory cache sweep interval in seconds
    pub cleanup_interval: u64,
    /// Number of job status records kept
    pub job_history_limit: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `DATABASE_PATH` - SQLite file (default: students.db)
    /// - `CACHE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_URL` - Redis URL (default: redis://localhost:6379)
    /// - `CACHE_TTL` - Listing TTL in seconds (default: 43200)
    /// - `CACHE_TIMEOUT_MS` - Redis call timeout (default: 250)
    /// - `SESSION_TTL` - Session lifetime in seconds (default: 86400)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `JOB_HISTORY_LIMIT` - Retained job records (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            cache_backend: parse_var("CACHE_BACKEND").unwrap_or(defaults.cache_backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            cache_timeout_ms: parse_var("CACHE_TIMEOUT_MS").unwrap_or(defaults.cache_timeout_ms),
            session_ttl: parse_var("SESSION_TTL").unwrap_or(defaults.session_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            job_history_limit: parse_var("JOB_HISTORY_LIMIT")
                .unwrap_or(defaults.job_history_limit),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            database_path: "students.db".to_string(),
            cache_backend: CacheBackendKind::Redis,
            redis_url: "redis://localhost:6379".to_string(),
            cache_ttl: DEFAULT_LIST_TTL_SECS,
            cache_timeout_ms: 250,
            session_ttl: 86_400,
            cleanup_interval: 60,
            job_history_limit: 1000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.cache_backend, CacheBackendKind::Redis);
        assert_eq!(config.cache_ttl(), Duration::from_secs(43_200));
        assert_eq!(config.cache_timeout(), Duration::from_millis(250));
        assert_eq!(config.job_history_limit, 1000);
    }

    #[test]
    fn test_config_from_env() {
        // Only this test touches these variables
        env::set_var("CACHE_BACKEND", "Memory");
        env::set_var("CACHE_TTL", "not-a-number");
        env::set_var("JOB_HISTORY_LIMIT", "5");

        let config = Config::from_env();
        assert_eq!(config.cache_backend, CacheBackendKind::Memory);
        assert_eq!(config.cache_ttl, DEFAULT_LIST_TTL_SECS);
        assert_eq!(config.job_history_limit, 5);

        env::remove_var("CACHE_BACKEND");
        env::remove_var("CACHE_TTL");
        env::remove_var("JOB_HISTORY_LIMIT");
    }

    #[test]
    fn test_cache_backend_parse() {
        assert_eq!("redis".parse::<CacheBackendKind>(), Ok(CacheBackendKind::Redis));
        assert_eq!(" MEMORY ".parse::<CacheBackendKind>(), Ok(CacheBackendKind::Memory));
        assert!("memcached".parse::<CacheBackendKind>().is_err());
    }
}
