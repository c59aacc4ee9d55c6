use std::{sync::Arc, time::Duration};

use irrigation_common::{
    routes::{set_min_moisture_command, CMD_OFF, CMD_ON, CMD_REBOOT},
    ChatCommand, CommandOutcome, CommandReply, DeviceError, Operation, ProbeResult, PumpAction,
    StatusReport, StepResult, TimingConfig, VerifyPhase, MAX_MOISTURE_PERCENT,
};
use tracing::{debug, info, warn};

use crate::device::DeviceApi;

const PUMP_USAGE: &str = "Usage: /pump on or /pump off";
const SETMIN_USAGE: &str = "Usage: /setmin <0-100>";

pub struct Orchestrator<D> {
    device: Arc<D>,
    timing: TimingConfig,
}

impl<D: DeviceApi> Orchestrator<D> {
    pub fn new(device: Arc<D>, timing: TimingConfig) -> Self {
        Self { device, timing }
    }

    pub async fn dispatch(&self, command: ChatCommand) -> CommandOutcome {
        match command {
            ChatCommand::Help => CommandOutcome::completed(Operation::Help, ""),
            ChatCommand::Ping => self.check_connection().await,
            ChatCommand::On => self.set_automation(true).await,
            ChatCommand::Off => self.set_automation(false).await,
            ChatCommand::Status => self.status().await,
            ChatCommand::Pump(None) => {
                CommandOutcome::rejected(Operation::Pump { desired: None }, PUMP_USAGE)
            }
            ChatCommand::Pump(Some(action)) => self.set_pump(&action).await,
            ChatCommand::SetMin(arg) => match arg.as_deref().map(str::parse::<i64>) {
                Some(Ok(value)) => self.set_minimum_moisture(value).await,
                _ => CommandOutcome::rejected(Operation::SetMinMoisture, SETMIN_USAGE),
            },
            ChatCommand::Reboot => self.reboot().await,
            ChatCommand::Test => self.run_diagnostic().await,
            ChatCommand::Unknown(name) => CommandOutcome::rejected(
                Operation::Help,
                format!("Unknown command /{name}; try /help"),
            ),
        }
    }

    pub async fn check_connection(&self) -> CommandOutcome {
        if let Err(err) = self.device.ping().await {
            return CommandOutcome::device_failed(Operation::Ping, &err);
        }
        match self.device.fetch_status().await {
            Ok(report) => {
                CommandOutcome::completed(Operation::Ping, "Connected").with_after(Some(report))
            }
            Err(err) => CommandOutcome::device_failed(Operation::Ping, &err),
        }
    }

    pub async fn status(&self) -> CommandOutcome {
        match self.device.fetch_status().await {
            Ok(report) => CommandOutcome::completed(Operation::Status, "Latest device reading")
                .with_after(Some(report)),
            Err(err) => CommandOutcome::device_failed(Operation::Status, &err),
        }
    }

    pub async fn set_automation(&self, enabled: bool) -> CommandOutcome {
        let operation = Operation::Automation { enabled };
        let (cmd, fallback) = if enabled {
            (CMD_ON, "Automatic control enabled")
        } else {
            (CMD_OFF, "Automatic control disabled")
        };

        let reply = match self.device.send_command(cmd).await {
            Ok(reply) => reply,
            Err(err) => return CommandOutcome::device_failed(operation, &err),
        };

        match self.device.fetch_status().await {
            Ok(report) => CommandOutcome::completed(operation, reply.message_or(fallback))
                .with_after(Some(report)),
            Err(err) => CommandOutcome::device_failed(operation, &err),
        }
    }

    pub async fn set_pump(&self, desired: &str) -> CommandOutcome {
        let Some(action) = PumpAction::parse(desired) else {
            return CommandOutcome::rejected(Operation::Pump { desired: None }, PUMP_USAGE);
        };
        self.verified_pump_toggle(action).await
    }

    async fn verified_pump_toggle(&self, action: PumpAction) -> CommandOutcome {
        let operation = Operation::Pump {
            desired: Some(action),
        };
        let mut phase = VerifyPhase::Idle;
        let mut before: Option<StatusReport> = None;
        let mut after: Option<StatusReport> = None;
        let mut reply = CommandReply::default();
        let mut failure: Option<DeviceError> = None;

        while !phase.is_terminal() {
            let step = match phase {
                VerifyPhase::Idle => StepResult::Done,
                VerifyPhase::CapturingBefore => match self.device.fetch_status().await {
                    Ok(report) => {
                        before = Some(report);
                        StepResult::Done
                    }
                    Err(err) => {
                        failure = Some(err);
                        StepResult::Failed
                    }
                },
                VerifyPhase::Sending => match self.device.send_command(action.command()).await {
                    Ok(received) => {
                        reply = received;
                        StepResult::Done
                    }
                    Err(err) => {
                        failure = Some(err);
                        StepResult::Failed
                    }
                },
                VerifyPhase::Settling => {
                    tokio::time::sleep(self.settle_delay()).await;
                    StepResult::Done
                }
                VerifyPhase::CapturingAfter => match self.device.fetch_status().await {
                    Ok(report) => {
                        let matched = report.pump == action.is_on();
                        after = Some(report);
                        StepResult::Verified(matched)
                    }
                    Err(err) => {
                        failure = Some(err);
                        StepResult::Failed
                    }
                },
                VerifyPhase::Confirmed
                | VerifyPhase::NotConfirmed
                | VerifyPhase::TransportFailed => break,
            };
            let next = phase.advance(step);
            debug!("pump {}: {} -> {}", action.as_str(), phase.as_str(), next.as_str());
            phase = next;
        }

        let outcome = match (phase, failure) {
            (VerifyPhase::Confirmed, _) => CommandOutcome::completed(
                operation,
                reply.message_or(&format!("Pump turned {}", action.as_str())),
            ),
            (VerifyPhase::NotConfirmed, _) => {
                warn!("pump {} command did not take effect", action.as_str());
                CommandOutcome::not_confirmed(
                    operation,
                    format!(
                        "Command did not take effect: pump is still {}",
                        if action.is_on() { "off" } else { "on" }
                    ),
                )
            }
            (_, Some(err)) => CommandOutcome::device_failed(operation, &err),
            (_, None) => CommandOutcome::device_failed(
                operation,
                &DeviceError::Unreachable("pump sequence aborted".to_string()),
            ),
        };

        outcome.with_before(before).with_after(after).with_phase(phase)
    }

    pub async fn set_minimum_moisture(&self, value: i64) -> CommandOutcome {
        let operation = Operation::SetMinMoisture;
        let Some(value) = u8::try_from(value)
            .ok()
            .filter(|value| *value <= MAX_MOISTURE_PERCENT)
        else {
            return CommandOutcome::rejected(
                operation,
                format!("Minimum moisture must be between 0 and {MAX_MOISTURE_PERCENT}, got {value}"),
            );
        };

        match self.device.send_command(&set_min_moisture_command(value)).await {
            Ok(reply) => CommandOutcome::completed(
                operation,
                reply.message_or(&format!("Minimum moisture set to {value}%")),
            ),
            Err(err) => CommandOutcome::device_failed(operation, &err),
        }
    }

    pub async fn reboot(&self) -> CommandOutcome {
        self.device.fire_command(CMD_REBOOT).await;
        info!(
            "reboot sent, waiting {}s before probing",
            self.timing.reboot_grace_secs
        );
        tokio::time::sleep(Duration::from_secs(self.timing.reboot_grace_secs)).await;

        match self.device.ping().await {
            Ok(()) => CommandOutcome::completed(Operation::Reboot, "Device restarted successfully"),
            Err(err) => {
                warn!("device still unresponsive after reboot: {err}");
                CommandOutcome::unresponsive(
                    Operation::Reboot,
                    format!("Device did not answer after reboot, check the hardware ({err})"),
                )
            }
        }
    }

    pub async fn run_diagnostic(&self) -> CommandOutcome {
        let ping = self.device.ping().await;
        let status = self.device.fetch_status().await;
        let tcp = self.device.probe_tcp().await;

        let probes = vec![
            ProbeResult::from_result("HTTP ping", &ping),
            ProbeResult::from_result("Status", &status),
            ProbeResult::from_result("TCP connect", &tcp),
        ];
        let failed = probes.iter().filter(|probe| !probe.passed).count();
        let total = probes.len();

        let outcome = if failed == 0 {
            CommandOutcome::completed(Operation::Diagnostic, format!("All {total} probes passed"))
        } else {
            CommandOutcome::failed(
                Operation::Diagnostic,
                format!("{failed} of {total} probes failed"),
            )
        };

        outcome.with_after(status.ok()).with_probes(probes)
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.timing.pump_settle_secs)
    }
}
