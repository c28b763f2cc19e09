//! S3O Gate
//!
//! Demo service: a "hello world" handler behind S3O authentication.

use s3o_gate::auth::{KeyCache, PublicKeyFetcher, SignatureVerifier};
use s3o_gate::config::Config;
use s3o_gate::cookies::SessionCookies;
use s3o_gate::middleware::GateState;
use s3o_gate::observability::metrics::init_metrics_recorder;
use s3o_gate::routes;
use s3o_gate::tasks::spawn_key_refresh;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3o_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting S3O gate");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        public_key_url = %config.public_key_url,
        authenticate_url = %config.authenticate_url,
        key_refresh_seconds = config.key_refresh_seconds,
        "Configuration loaded successfully"
    );

    // Must be installed before any metric is recorded
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    // Parse bind address before starting background work
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    // Start key refresh; the first fetch happens immediately
    let keys = Arc::new(KeyCache::with_refresh_period(config.key_refresh_period()));
    let cancel_token = CancellationToken::new();
    let refresh_handle = spawn_key_refresh(
        Arc::clone(&keys),
        PublicKeyFetcher::new(config.public_key_url.clone()),
        cancel_token.clone(),
    );

    let gate = Arc::new(GateState {
        verifier: SignatureVerifier::new(keys),
        cookies: SessionCookies::new(config.cookie_max_age()),
        authenticate_url: config.authenticate_url,
    });

    let app = routes::build_routes(gate, metrics_handle);

    info!("S3O gate listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the refresh task and wait for it to exit
    cancel_token.cancel();
    if let Err(e) = refresh_handle.await {
        error!("Key refresh task failed: {}", e);
    }

    info!("S3O gate shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
