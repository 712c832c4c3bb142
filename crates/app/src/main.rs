//! AOtD - Album of the Day scheduler
//!
//! Loads the configuration, opens the pool database, serves the request
//! protocol and runs the daily draw until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use aotd_core::config::ConfigError;
use aotd_core::Config;
use aotd_net::Server;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handler;
mod state;
mod trigger;

use handler::ProtocolHandler;
use state::AppState;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] aotd_core::Error),
    #[error(transparent)]
    Net(#[from] aotd_net::Error),
    #[error("Failed to create tokio runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting AOtD");

    if let Err(e) = run() {
        tracing::error!("Failed to start: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), StartupError> {
    let config = Config::load_or_default()?;
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let addr = SocketAddr::new(config.listen_addr, config.listen_port);
        if !addr.ip().is_loopback() {
            tracing::warn!(%addr, "Listening beyond loopback; callers' identities are trusted as sent");
        }
        let state = Arc::new(AppState::new(config)?);

        let handler = Arc::new(ProtocolHandler::new(state.clone()));
        let server = Server::bind(addr, handler).await?;

        let (shutdown_tx, _) = broadcast::channel(1);
        let trigger = tokio::spawn(trigger::run(state, shutdown_tx.subscribe()));

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Could not listen for interrupt, shutting down");
        }

        tracing::info!("Shutting down");
        server.shutdown();
        let _ = shutdown_tx.send(());
        if trigger.await.is_err() {
            tracing::warn!("Daily trigger ended abnormally");
        }
        Ok::<(), StartupError>(())
    })
}
