//! room-relay server entry point.
//!
//! Loads configuration, spawns one hub per room and serves the WebSocket
//! and HTTP endpoints until the process is killed.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use room_relay::config::{LogFormat, RelayConfig};
use room_relay::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = RelayConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        rooms = ?config.room_ids,
        send_timeout_ms = config.send_timeout.map(|d| d.as_millis()),
        "starting room-relay"
    );

    // Build domain layer
    let state = server::build_state(&config).context("building room registry")?;

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    server::serve(listener, state).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}
