// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use aurore_blobs_relay::{
    api::router, config::Config, logging, relay::Relay, state::AppState, store,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    logging::init(config.log_format);

    let store = store::from_config(&config.store)?;
    let relay = Relay::new(config.shared_secret(), store);

    if !relay.is_configured() {
        warn!("AURORE_BLOBS_TOKEN is not set; every relay request will fail with 500");
    }
    if relay.store_backend() == "memory" {
        warn!("Netlify credentials not set; using the in-memory store (data is lost on restart)");
    }

    let backend = relay.store_backend();
    let app = router(AppState::new(relay));

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, backend, "Aurore blobs relay listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Aurore blobs relay stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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
