//! The `taskrelay-server` binary.

use std::net::SocketAddr;
use std::sync::Arc;
use taskrelay_server::{build_router, AppState, AuthConfig, ServerConfig, TokenIssuer};
use taskrelay_store::{FileStoreConfig, RelayStore};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    // The server refuses to start without a usable store.
    let store = match &config.data_dir {
        Some(dir) => match RelayStore::open(dir, FileStoreConfig::default()) {
            Ok(store) => {
                info!("durable store opened at {}", dir.display());
                Arc::new(store)
            }
            Err(err) => {
                error!("cannot open durable store at {}: {err}", dir.display());
                std::process::exit(1);
            }
        },
        None => {
            info!("running on the in-memory store; state will not survive a restart");
            Arc::new(RelayStore::in_memory())
        }
    };

    let tokens = TokenIssuer::new(
        AuthConfig::new(config.secret.clone()).with_expiry(config.token_expiry),
    );
    let app = build_router(AppState::new(store, tokens));

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("cannot bind {}: {err}", config.bind_addr);
            std::process::exit(1);
        }
    };

    info!("listening on http://{}", config.bind_addr);
    info!("  tasks:  http://{}/api/tasks", config.bind_addr);
    info!("  sync:   http://{}/api/sync", config.bind_addr);
    info!("  health: http://{}/health", config.bind_addr);

    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("server error: {err}");
        std::process::exit(1);
    }
}
