use powerbot_core::config::BackupConfig;
use powerbot_core::DataRoot;
use powerbot_replication::ReplicationEngine;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let data_root = DataRoot::resolve();
    let config_path = data_root.backup_dir().join("config.toml").to_string_lossy().into_owned();
    let config = BackupConfig::load(&config_path).unwrap_or_else(|e| {
        tracing::warn!("backup config load failed ({e}), using defaults");
        BackupConfig::default()
    });

    let engine = ReplicationEngine::new(&data_root, config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    info!("powerbot-backup starting replication loop");
    engine.run(shutdown_rx).await;

    Ok(())
}
