//! CineSync Server — synchronized watch-party platform.
//!
//! Entry point that wires the engine, HTTP layer, and configuration
//! together and runs the server until shutdown.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use cinesync_auth::jwt::verifier::TokenVerifier;
use cinesync_core::config::AppConfig;
use cinesync_core::error::AppError;
use cinesync_core::traits::archive::NoopArchive;
use cinesync_core::traits::catalog::InMemoryCatalog;
use cinesync_realtime::connection::authenticator::WsAuthenticator;
use cinesync_realtime::server::RealtimeEngine;

#[tokio::main]
async fn main() {
    let env = std::env::var("CINESYNC_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CineSync v{}", env!("CARGO_PKG_VERSION"));

    // Collaborators. The standalone binary runs with an in-memory catalog
    // and no archive sink; platform deployments inject their own.
    let catalog = Arc::new(InMemoryCatalog::new());
    let archive = Arc::new(NoopArchive);

    let verifier = Arc::new(TokenVerifier::new(&config.auth));
    let authenticator = Arc::new(WsAuthenticator::new(verifier));

    let engine = RealtimeEngine::new(config.realtime.clone(), catalog, archive);
    engine.start();

    let state = cinesync_api::state::AppState::new(
        Arc::new(config.clone()),
        engine.clone(),
        authenticator,
    );
    let app = cinesync_api::router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("CineSync server listening on {addr}");

    let shutdown_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("CineSync server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
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
}
