//! Guandan Game Server
//!
//! Reads configuration from the environment and serves WebSocket tables.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guandan::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    info!("Guandan Server v{}", VERSION);
    info!(
        "Max connections: {}, bot delay: {:?}",
        config.max_connections, config.room.bot_delay
    );

    let server = GameServer::new(config.clone());
    tokio::select! {
        result = server.run() => {
            result.with_context(|| format!("server on {} failed", config.bind_addr))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            server.shutdown();
        }
    }

    Ok(())
}
