//! HTTP server module
//!
//! Axum front end: scrape endpoints per product line, self-telemetry and
//! health. Serves plain HTTP or, when configured, HTTPS through
//! axum-server.

pub mod handlers;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::metrics::{internal_metrics, InternalMetrics};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub metrics: InternalMetrics,
}

impl AppState {
    /// State backed by the process-wide telemetry registry
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            metrics: internal_metrics().clone(),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics/flasharray", get(handlers::flasharray))
        .route("/metrics/flasharray/:scope", get(handlers::flasharray_scope))
        .route("/metrics/flashblade", get(handlers::flashblade))
        .route("/metrics/flashblade/:scope", get(handlers::flashblade_scope))
        .route("/metrics/exporter", get(handlers::exporter_metrics))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn bind_addr(config: &Config) -> Result<SocketAddr> {
    let address = &config.server.bind_address;
    let ip: IpAddr = if address == "localhost" {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        address
            .parse()
            .with_context(|| format!("Invalid bind_address '{}'", address))?
    };
    Ok(SocketAddr::from((ip, config.server.port)))
}

/// Run the HTTP server until Ctrl-C or SIGTERM
///
/// # Errors
/// Returns an error if the address cannot be bound or the TLS material
/// cannot be loaded
pub async fn run(config: Config) -> Result<()> {
    let addr = bind_addr(&config)?;
    let tls = config.server.tls.clone();
    let app = router(AppState::new(config));

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    match (tls.enabled, tls.cert_file, tls.key_file) {
        (true, Some(cert), Some(key)) => {
            let rustls = RustlsConfig::from_pem_file(&cert, &key)
                .await
                .with_context(|| format!("Failed to load TLS material from {} / {}", cert, key))?;
            info!(address = %addr, "Server listening (https)");
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        (true, _, _) => anyhow::bail!("TLS enabled without cert_file and key_file"),
        _ => {
            info!(address = %addr, "Server listening");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
