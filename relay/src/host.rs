use std::{sync::Arc, time::Duration};

use anyhow::Context;
use irrigation_common::RelayConfig;
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::{
    console,
    device::HttpDevice,
    heartbeat::HeartbeatScheduler,
    notify::{DiscordNotifier, LogNotifier, Notifier},
    orchestrator::Orchestrator,
};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = RelayConfig::from_lookup(|key| std::env::var(key).ok())
        .context("failed to load relay configuration")?;

    info!("device address: {}", config.device.base_url());
    info!("monitoring channel id: {}", config.chat.channel_id);
    info!("heartbeat policy: {:?}", config.heartbeat.failure_policy);

    if config.chat.log_only {
        warn!("RELAY_LOG_ONLY set, notifications go to the log instead of the channel");
        serve(config, Arc::new(LogNotifier)).await
    } else {
        let notifier =
            DiscordNotifier::new(config.chat.clone()).context("failed to build chat client")?;
        serve(config, Arc::new(notifier)).await
    }
}

async fn serve<N: Notifier + 'static>(config: RelayConfig, notifier: Arc<N>) -> anyhow::Result<()> {
    let device = Arc::new(HttpDevice::new(
        config.device.clone(),
        Duration::from_secs(config.timing.request_timeout_secs),
    ));
    let orchestrator = Arc::new(Orchestrator::new(device.clone(), config.timing.clone()));

    let heartbeat =
        HeartbeatScheduler::new(device, notifier.clone(), config.heartbeat.clone()).start();

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = console::run(orchestrator, notifier, stdin) => {
            result.context("console input failed")?;
            info!("console input closed, heartbeat keeps running");
            tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
        }
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
        }
    }

    warn!("shutting down relay");
    heartbeat.abort();
    Ok(())
}
