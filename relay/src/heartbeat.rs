use std::{sync::Arc, time::Duration};

use irrigation_common::{render, routes::CMD_REBOOT, HeartbeatConfig, HeartbeatEvent};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::{device::DeviceApi, notify::Notifier};

pub struct HeartbeatScheduler<D, N> {
    device: Arc<D>,
    notifier: Arc<N>,
    config: HeartbeatConfig,
}

impl<D, N> HeartbeatScheduler<D, N>
where
    D: DeviceApi + 'static,
    N: Notifier + 'static,
{
    pub fn new(device: Arc<D>, notifier: Arc<N>, config: HeartbeatConfig) -> Self {
        Self {
            device,
            notifier,
            config,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.config.interval_minutes.max(1).saturating_mul(60))
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        self.wait_until_ready().await;
        info!(
            "heartbeat monitor started, interval {}s",
            self.period().as_secs()
        );

        let mut interval = tokio::time::interval(self.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut consecutive_failures = 0;
        loop {
            interval.tick().await;
            consecutive_failures = self.tick(consecutive_failures).await;
        }
    }

    async fn wait_until_ready(&self) {
        let retry = Duration::from_secs(self.config.ready_retry_secs.max(1));
        loop {
            match self.notifier.ready().await {
                Ok(()) => return,
                Err(err) => {
                    warn!("heartbeat waiting for output channel: {err}");
                    tokio::time::sleep(retry).await;
                }
            }
        }
    }

    pub async fn tick(&self, consecutive_failures: u32) -> u32 {
        let event = HeartbeatEvent::from_result(self.device.fetch_status().await);
        match &event {
            HeartbeatEvent::Healthy(report) => {
                debug!("heartbeat ok: moisture {}%, pump {}", report.moisture, report.pump)
            }
            HeartbeatEvent::Unreachable(err) => error!("device not responding: {err}"),
        }

        if let Err(err) = self.notifier.notify(&render::heartbeat(&event)).await {
            warn!("heartbeat notification failed: {err}");
        }

        if event.is_healthy() {
            return 0;
        }

        let failures = consecutive_failures.saturating_add(1);
        if self.config.failure_policy.should_reboot(failures) {
            warn!("{failures} failed heartbeat(s), sending best-effort reboot");
            self.device.fire_command(CMD_REBOOT).await;
            return 0;
        }
        failures
    }
}
