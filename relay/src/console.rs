use std::sync::Arc;

use irrigation_common::{render, ChatCommand, Notification};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    task::{JoinError, JoinSet},
};
use tracing::{info, warn};

use crate::{device::DeviceApi, notify::Notifier, orchestrator::Orchestrator};

pub async fn run<D, N, R>(
    orchestrator: Arc<Orchestrator<D>>,
    notifier: Arc<N>,
    input: R,
) -> anyhow::Result<()>
where
    D: DeviceApi + 'static,
    N: Notifier + 'static,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut running = JoinSet::new();

    while let Some(line) = lines.next_line().await? {
        let Some(command) = ChatCommand::parse(&line) else {
            continue;
        };
        info!("command received: {}", line.trim());

        let orchestrator = orchestrator.clone();
        let notifier = notifier.clone();
        running.spawn(async move {
            if command == ChatCommand::Reboot {
                publish(notifier.as_ref(), &render::rebooting()).await;
            }
            let outcome = orchestrator.dispatch(command).await;
            publish(notifier.as_ref(), &render::outcome(&outcome)).await;
        });
        reap_finished(&mut running);
    }

    while let Some(result) = running.join_next().await {
        log_task_result(result);
    }
    Ok(())
}

fn reap_finished(running: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(result) = running.try_join_next() {
        log_task_result(result);
        reaped += 1;
    }
    reaped
}

fn log_task_result(result: Result<(), JoinError>) {
    if let Err(err) = result {
        warn!("command task failed: {err}");
    }
}

async fn publish<N: Notifier>(notifier: &N, notification: &Notification) {
    if let Err(err) = notifier.notify(notification).await {
        warn!("failed to publish \"{}\": {err}", notification.title);
    }
}
