//! Student Registry - student records over HTTP
//!
//! CRUD over student records with a read-through listing cache and
//! background bulk jobs.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use student_registry::api::{create_router, AppState};
use student_registry::auth::SessionRegistry;
use student_registry::cache::{CacheBackend, MemoryCache, RedisCache};
use student_registry::config::{CacheBackendKind, Config};
use student_registry::store::SqliteStudentStore;
use student_registry::{spawn_cleanup_task, JobRunner, StudentService};

/// Main entry point for the student registry server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the record store and connect the cache
/// 4. Start the background job worker (and the cache sweeper for the memory backend)
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Drain queued jobs, stop the sweeper, close the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "student_registry=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Student Registry");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, database={}, cache={:?}, cache_ttl={}s",
        config.server_port, config.database_path, config.cache_backend, config.cache_ttl
    );

    let store = Arc::new(
        SqliteStudentStore::open(&config.database_path)
            .with_context(|| format!("failed to open database {}", config.database_path))?,
    );

    let (cache, sweeper) = connect_cache(&config).await?;

    let service = Arc::new(StudentService::new(store, cache.clone(), config.cache_ttl()));
    let sessions = Arc::new(SessionRegistry::new(config.session_ttl()));
    let jobs = Arc::new(JobRunner::spawn(service.clone(), config.job_history_limit));

    let app = create_router(AppState::new(service, sessions, jobs.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Draining background jobs");
    jobs.shutdown().await;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
        debug!("Cache sweeper aborted");
    }

    match cache.close().await {
        Ok(()) => info!("Cache connection closed"),
        Err(e) => debug!("Cache close skipped: {}", e),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Builds and connects the configured cache backend.
///
/// A Redis server that cannot be reached at startup is not fatal: every
/// listing then goes to the store until the process is restarted.
async fn connect_cache(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CacheBackend>, Option<JoinHandle<()>>)> {
    match config.cache_backend {
        CacheBackendKind::Redis => {
            let cache = RedisCache::new(&config.redis_url, config.cache_timeout())
                .with_context(|| format!("invalid REDIS_URL {}", config.redis_url))?;
            if let Err(e) = cache.init().await {
                warn!("Redis unavailable, listing will not be cached: {}", e);
            }
            let cache: Arc<dyn CacheBackend> = Arc::new(cache);
            Ok((cache, None))
        }
        CacheBackendKind::Memory => {
            let memory = Arc::new(MemoryCache::new());
            memory.init().await?;
            let sweeper = spawn_cleanup_task(memory.clone(), config.cleanup_interval);
            info!("In-memory cache initialized");
            let cache: Arc<dyn CacheBackend> = memory;
            Ok((cache, Some(sweeper)))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
