use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use powerbot_core::config::WebConfig;
use powerbot_core::DataRoot;

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let data_root = DataRoot::resolve();
    let config = WebConfig::load(&data_root.web_dir().join("config.toml").to_string_lossy())
        .unwrap_or_else(|e| {
            tracing::warn!("web config load failed ({e}), using defaults");
            WebConfig::default()
        });

    let conn = powerbot_store::open(&data_root.db_path())?;
    powerbot_economy::db::init_db(&conn)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(app::AppState::new(config, conn));
    let router = app::build_router(state);

    info!("powerbot-web listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
