mod config;
mod error;
mod forwarding;
mod history;
mod logging;
mod models;
mod page;
mod routes;
mod saved;

use config::Config;
use restdesk_core::{DocumentKey, Forwarder, HistoryRecorder, JsonStore, SavedRequests};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct AppState {
    pub forwarder: Forwarder,
    pub history: HistoryRecorder,
    pub saved: SavedRequests,
}

impl AppState {
    pub fn new(store: JsonStore, forwarder: Forwarder) -> Self {
        Self {
            forwarder,
            history: HistoryRecorder::new(store.clone()),
            saved: SavedRequests::new(store),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new();
    logging::init_tracing(&config)?;

    info!("Starting restdesk server...");

    let store = JsonStore::open(&config.data_dir)?;
    info!(
        path = %store.path(DocumentKey::SavedRequests).display(),
        "Saved requests will be stored here"
    );
    info!(
        path = %store.path(DocumentKey::History).display(),
        "History will be stored here"
    );

    let app_state = Arc::new(AppState::new(store, Forwarder::new()?));
    let app = routes::router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("restdesk server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => info!("Ctrl-C received, shutting down..."),
        _ = terminate => info!("SIGTERM received, shutting down..."),
    }
}
