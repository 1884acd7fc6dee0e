//! gordon - document server
//!
//! Serves pages over the gordon protocol from an in-memory store.

mod docs;

use gordon_server::{tls, Config, DocumentStore, Listener, ListenerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (from file if GORDON_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("GORDON_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    tracing::info!("Starting gordon server");
    tracing::info!("  Bind address: {}", config.network.bind_addr);
    tracing::info!("  Max connections: {}", config.network.max_connections);

    let mut store = DocumentStore::new();
    if config.documents.include_samples {
        for page in docs::samples() {
            store.insert(page);
        }
    }
    if let Some(ref path) = config.documents.path {
        let pages = DocumentStore::load_yaml(path)?;
        tracing::info!("  Documents: {} page(s) from {}", pages.len(), path.display());
        for page in pages {
            if store.insert(page).is_some() {
                tracing::warn!("Document file replaces a bundled page");
            }
        }
    }
    if store.is_empty() {
        tracing::warn!("No documents configured; only the empty index will be served");
    }
    tracing::info!("  Serving {} document(s)", store.len());

    let mut listener_config = ListenerConfig::from_network(&config.network);
    match tls::acceptor_from_config(&config.tls)? {
        Some(acceptor) => {
            tracing::info!("  TLS: enabled");
            if config.tls.require_client_cert {
                tracing::info!("  mTLS: enabled (client certificate required)");
            }
            listener_config = listener_config.with_tls(acceptor);
        }
        None => tracing::warn!("  TLS: disabled, documents are served in plaintext"),
    }

    let listener = Arc::new(Listener::new(Arc::new(store), listener_config));

    let shutdown_listener = listener.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal, stopping listener...");
        shutdown_listener.close();
    });

    listener.listen_and_serve(&config.network.bind_addr).await?;

    let stats = listener.stats();
    tracing::info!(
        requests = stats.requests_total(),
        errors = stats.errors_total(),
        "Server stopped"
    );
    Ok(())
}
