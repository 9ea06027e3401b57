mod adapters;
mod application;
mod config;
mod domain;
mod interface;
mod ports;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{HttpProber, JsonFileStore, LogNotifier, MemoryStore, WebhookNotifier};
use application::{Poller, Registry};
use config::Config;
use domain::HostSettings;
use interface::http::create_router;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hostwatch={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting hostwatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Host persistence
    let store: Arc<dyn ports::HostStore> = match &config.hosts_file {
        Some(path) => {
            let store = JsonFileStore::new(path);
            info!("✓ Host file: {}", store.path().display());
            Arc::new(store)
        }
        None => {
            warn!("⚠ No hosts_file configured. Hosts will not survive a restart.");
            Arc::new(MemoryStore::new())
        }
    };

    let settings = HostSettings {
        history_size: config.history_size,
        failure_threshold: config.failure_threshold,
    };
    let registry = Arc::new(Registry::new(store, settings, config.max_hosts));
    let loaded = registry.bootstrap().await?;
    info!("✓ Registry loaded with {} host(s)", loaded);

    // Notifications
    let notifier: Arc<dyn ports::Notifier> = match &config.notify_webhook {
        Some(url) => {
            info!("✓ Notifications via webhook {}", url);
            Arc::new(WebhookNotifier::new(url.as_str())?)
        }
        None => {
            warn!("⚠ No notify_webhook configured. Notifications are only logged.");
            Arc::new(LogNotifier)
        }
    };

    // Poller
    let prober = Arc::new(HttpProber::new(config.probe_deadline())?);
    let poller = Poller::new(registry.clone(), prober, notifier, config.poll_period());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = tokio::spawn(poller.run(shutdown_rx));

    // Create HTTP server
    let app = create_router(registry.clone());
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ hostwatch listening on {}", addr);
    info!("  → API: http://localhost:{}/api/hosts", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown requested");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = poller_handle.await {
        error!("Poller task failed: {}", e);
    }
    if let Err(e) = registry.save().await {
        warn!("Final save of host file failed: {}", e);
    }

    info!("hostwatch stopped");
    Ok(())
}
