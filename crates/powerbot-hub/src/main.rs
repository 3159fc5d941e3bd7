use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tracing::info;

use powerbot_core::config::WsocketConfig;

mod health;
mod hub;
mod ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let data_root = powerbot_core::DataRoot::resolve();
    let config_path = data_root
        .events_websocket_dir()
        .join("config.toml")
        .to_string_lossy()
        .into_owned();
    let config = WsocketConfig::load(&config_path).unwrap_or_else(|e| {
        tracing::warn!("wsocket config load failed ({e}), using defaults");
        WsocketConfig::default()
    });

    let hub = Arc::new(hub::Hub::new());
    let router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(ws::ws_handler))
        .with_state(hub);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("powerbot-hub listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
