use tracing::info;

use powerbot_core::DataRoot;
use powerbot_supervisor::Supervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let data_root = DataRoot::resolve();
    let mut supervisor = Supervisor::new(&data_root)?;

    info!("powerbot-console starting autorun workers");
    supervisor.run_startup_autorun().await?;

    powerbot_supervisor::console::run(supervisor).await;

    Ok(())
}
