// File: services/beacon_backend/src/main.rs
use beacon_backend::{app, Stores};
use beacon_common::logging;
use beacon_common::JwtIdentityResolver;
use beacon_config::load_config;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config().map_err(|e| {
        eprintln!("Failed to load config: {}", e);
        e
    })?;

    // Held until exit so buffered log lines reach the file.
    let _log_guard = logging::init_with_level(
        logging::parse_level(&config.logging.level),
        config.logging.file.as_deref().map(Path::new),
    );

    info!("Starting Beacon API");

    let stores = Stores::connect(&config).await.map_err(|e| {
        error!("Database setup failed: {}", e);
        e
    })?;
    let resolver = Arc::new(JwtIdentityResolver::new(&config.auth));

    let app = app(stores.tokens, stores.locations, resolver);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
