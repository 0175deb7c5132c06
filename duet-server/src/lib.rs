//! Signaling relay: a registry of WebSocket connections and a router that
//! fans `signal` envelopes out to the other members of a room.

mod config;
mod error;
mod room;
mod signaling;

pub use config::ServerConfig;
pub use error::RouterError;
pub use room::*;
pub use signaling::*;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

/// Binds the configured address and serves the relay until the listener fails.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;
    serve_on(listener, SignalingService::new()).await
}

/// Serves `service` on an already bound listener.
pub async fn serve_on(listener: TcpListener, service: SignalingService) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Signaling server listening on ws://{}", addr);
    axum::serve(listener, service.app())
        .await
        .context("signaling server stopped")
}
