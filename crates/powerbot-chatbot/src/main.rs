use std::sync::{Arc, Mutex};

use tracing::info;

use powerbot_core::config::ChatBotConfig;
use powerbot_core::DataRoot;

mod economy_handler;
mod platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let data_root = DataRoot::resolve();
    let config_path = data_root
        .discord_bot_dir()
        .join("config.toml")
        .to_string_lossy()
        .into_owned();
    let config = ChatBotConfig::load(&config_path).unwrap_or_else(|e| {
        tracing::warn!("chat bot config load failed ({e}), using defaults");
        ChatBotConfig::default()
    });

    let conn = powerbot_store::open(&data_root.db_path())?;
    powerbot_economy::db::init_db(&conn)?;
    powerbot_identity::db::init_db(&conn)?;
    let db = Arc::new(Mutex::new(conn));

    let handler = economy_handler::EconomyMessageHandler::new(
        db,
        &data_root,
        config.platform.clone(),
        config.scope_id.clone(),
        config.points_per_message,
        config.points_interval_seconds,
    );

    let client = platform::UnconfiguredPlatformClient {
        platform: config.platform.clone(),
    };

    info!(
        platform = %config.platform,
        chat_id = %config.chat_id,
        poll_interval_ms = config.poll_interval_ms,
        "powerbot-chatbot starting pump"
    );

    let pump = powerbot_chatlistener::start(
        client,
        config.chat_id.clone(),
        vec![Arc::new(handler)],
        config.poll_interval_ms,
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    pump.stop().await;

    Ok(())
}
