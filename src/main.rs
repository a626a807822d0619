use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use kubettl_backend::{routes, AppState, Backends, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {:#}", e);
            return Err(e.into());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_target(false)
        .init();

    info!("🚀 Starting kubettl backend...");

    let backends = match Backends::from_config(&config).await {
        Ok(backends) => {
            info!("✅ Backends initialized");
            backends
        }
        Err(e) => {
            error!("❌ Failed to initialize backends: {:#}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(&backends, config.reconciler_settings());
    let shutdown = CancellationToken::new();

    let reconciler = match config.reconcile_interval() {
        Some(interval) => Some(tokio::spawn(
            state.reconciler.clone().run(interval, shutdown.clone()),
        )),
        None => {
            warn!("Internal reconcile schedule disabled, relying on POST /reconcile");
            None
        }
    };

    let app = routes::app(state);

    let listener = match tokio::net::TcpListener::bind(&config.server_address).await {
        Ok(listener) => {
            info!("🌐 Server listening on {}", config.server_address);
            listener
        }
        Err(e) => {
            error!("❌ Failed to bind to {}: {}", config.server_address, e);
            return Err(e.into());
        }
    };

    let server_shutdown = shutdown.clone();
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await
    {
        error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    shutdown.cancel();
    if let Some(handle) = reconciler {
        if let Err(e) = handle.await {
            warn!("Reconciler task ended abnormally: {}", e);
        }
    }

    info!("✅ Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
