use std::time::Duration;

use tracing::info;

use powerbot_core::config::ChatWatcherConfig;
use powerbot_core::DataRoot;
use powerbot_streamwatch::StreamWatcher;

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
        .youtube_bot_dir()
        .join("config.toml")
        .to_string_lossy()
        .into_owned();
    let config = ChatWatcherConfig::load(&config_path).unwrap_or_else(|e| {
        tracing::warn!("chat watcher config load failed ({e}), using defaults");
        ChatWatcherConfig::default()
    });

    let state_path = data_root.youtube_bot_dir().join("stream_state.json");
    let client = platform::UnconfiguredPlatformClient {
        platform: config.platform.clone(),
    };
    let mut watcher = StreamWatcher::new(client, state_path)?;

    info!(
        platform = %config.platform,
        poll_seconds = config.poll_seconds,
        "powerbot-chatwatcher starting detection loop"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_seconds.max(1)));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match watcher.detect().await {
                    Ok(outcome) if outcome.changed => {
                        info!(is_live = outcome.state.is_live, video_id = ?outcome.state.video_id, "broadcast state changed");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "stream detection failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
