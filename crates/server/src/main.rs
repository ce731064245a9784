use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jump_core::resolver::ResolverOptions;
use jump_core::scheduler::{BookmarkReloader, CacheSyncer, GarbageCollector, ServiceReloader};
use jump_core::store::{CacheStore, RedisStore};
use jump_core::{load_config, validate_config, MemoryIndex, Prober, Resolver};

use jump_server::api::create_router;
use jump_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("JUMP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    // Connect the cache store. A missing or unreachable store degrades the
    // service (no caching, counters lost on restart) but never blocks it.
    let store: Option<Arc<dyn CacheStore>> = match &config.cache {
        Some(cache) => {
            info!("Connecting to cache store at {}", cache.url);
            match RedisStore::connect(&cache.url, cache.entry_ttl()).await {
                Ok(store) => {
                    info!("Cache store connected");
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!("Cache store unavailable, running degraded: {}", e);
                    None
                }
            }
        }
        None => {
            info!("No cache store configured, running degraded");
            None
        }
    };

    let index = Arc::new(MemoryIndex::new());

    // Bootstrap the index from the store so counters survive restarts.
    if let Some(store) = &store {
        let syncer = CacheSyncer::new(Arc::clone(store), Arc::clone(&index));
        if let Err(e) = syncer.sync().await {
            warn!("Bootstrap sync failed, next reload will populate the index: {}", e);
        }
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Reloaders: manual triggers are capacity-1 so repeated requests
    // coalesce instead of queueing.
    let (reload_tx, reload_rx) = mpsc::channel::<()>(1);
    ServiceReloader::new(
        &config.catalog.service_file,
        store.clone(),
        Arc::clone(&index),
        config.catalog.reload_interval(),
    )
    .spawn(reload_rx, shutdown_tx.subscribe());

    let bookmark_reload_tx = match &config.catalog.bookmark_file {
        Some(bookmark_file) => {
            info!("Bookmark file configured: {:?}", bookmark_file);
            let (tx, rx) = mpsc::channel::<()>(1);
            BookmarkReloader::new(
                bookmark_file,
                store.clone(),
                Arc::clone(&index),
                config.catalog.reload_interval(),
            )
            .spawn(rx, shutdown_tx.subscribe());
            Some(tx)
        }
        None => {
            info!("Bookmark file not configured, bookmark search disabled");
            None
        }
    };

    GarbageCollector::new(
        store.clone(),
        Arc::clone(&index),
        config.catalog.gc_interval(),
        config.catalog.gc_threshold(),
    )
    .spawn(shutdown_tx.subscribe());

    let prober = Prober::new(
        config.resolver.tls_timeout(),
        config.resolver.skip_tls_validation,
    )
    .context("Failed to build the TLS prober")?;

    let resolver = Resolver::new(
        Arc::clone(&index),
        store.clone(),
        prober,
        ResolverOptions {
            home_url: config.resolver.home_url.clone(),
            allowed_domains: config.resolver.allowed_domains(),
            max_candidates: config.resolver.max_candidates,
            cache_ttl: config
                .cache
                .as_ref()
                .map(|c| c.resolution_ttl())
                .unwrap_or(jump_core::store::DEFAULT_RESOLUTION_TTL),
            op_timeout: config.resolver.tls_timeout(),
        },
    );

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&index),
        store.clone(),
        resolver,
        reload_tx,
        bookmark_reload_tx,
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let mut drain_rx = shutdown_tx.subscribe();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = drain_rx.recv().await;
            })
            .await
    });

    shutdown_signal().await;
    info!("Shutting down gracefully");

    // Stop the background loops and start draining the listener.
    let _ = shutdown_tx.send(());

    let grace = Duration::from_secs(config.server.shutdown_grace_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result
            .context("Server task panicked")?
            .context("Server error")?,
        Err(_) => warn!("Drain grace period elapsed with requests still in flight"),
    }

    // The cache client goes last.
    drop(store);
    info!("Shutdown complete");

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
