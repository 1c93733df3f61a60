use std::sync::Arc;

use radio_time_machine::config::{Cli, Driver, RadioOptions};
use radio_time_machine::store::memory_store::MemoryStore;
use radio_time_machine::store::redis_store::RedisStore;
use radio_time_machine::store::{ChunkStore, PresetStore};
use radio_time_machine::supervisor::Supervisor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::load();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},radio_time_machine=debug", cli.loglevel).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(driver = ?cli.driver, "configuration loaded");

    let options = RadioOptions::from(&cli);

    match cli.driver {
        Driver::Memory => {
            let store = Arc::new(MemoryStore::new());
            run(store, options, cli.addr).await
        }
        Driver::Redis => {
            let url = radio_time_machine::config::redis_url(&cli);
            let store = Arc::new(RedisStore::connect(&url).await?);
            tracing::info!("connected to redis");
            run(store, options, cli.addr).await
        }
    }
}

/// Runs one full supervisor lifecycle: power on, wait for SIGINT/SIGTERM,
/// power off. Generic over the chunk/preset store so both drivers share
/// this path.
async fn run<S>(store: Arc<S>, options: RadioOptions, addr: String) -> anyhow::Result<()>
where
    S: ChunkStore + PresetStore + Send + Sync + 'static,
{
    let supervisor = Supervisor::new(store, options, addr);
    supervisor.on().await?;

    wait_for_shutdown_signal().await;

    supervisor.off().await;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received ctrl-c");
    }
}
