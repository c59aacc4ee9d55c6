use chrono::{DateTime, Utc};

use crate::{
    command::COMMAND_CATALOG,
    outcome::{CommandOutcome, HeartbeatEvent, Operation, OutcomeKind},
    types::StatusReport,
};

pub const FOOTER: &str = "Smart Farm System";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn color(self) -> u32 {
        match self {
            Self::Ok => 0x00FF00,
            Self::Info => 0x7289DA,
            Self::Warning => 0xFFFF00,
            Self::Error => 0xFF0000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub fields: Vec<Field>,
    pub timestamp: DateTime<Utc>,
    pub footer: &'static str,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            fields: Vec::new(),
            timestamp: Utc::now(),
            footer: FOOTER,
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    pub fn to_plain_text(&self) -> String {
        let mut text = format!("{}\n{}", self.title, self.description);
        for field in &self.fields {
            text.push_str(&format!("\n  {}: {}", field.name, field.value));
        }
        text
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn moisture(report: &StatusReport) -> String {
    format!("{}%", report.moisture)
}

fn last_error(report: &StatusReport) -> String {
    report
        .last_error
        .clone()
        .unwrap_or_else(|| "None".to_string())
}

pub fn status_fields(notification: Notification, report: &StatusReport) -> Notification {
    notification
        .field("Time", report.timestamp.clone(), false)
        .field("Moisture", moisture(report), true)
        .field("Pump", on_off(report.pump), true)
        .field(
            "Automation",
            if report.automation_enabled {
                "enabled"
            } else {
                "disabled"
            },
            true,
        )
        .field(
            "WiFi",
            if report.wifi_connected {
                "connected"
            } else {
                "disconnected"
            },
            true,
        )
        .field("IP", report.ip.clone(), true)
        .field("Error", last_error(report), false)
}

fn title_for(outcome: &CommandOutcome) -> String {
    let ok = outcome.success();
    match (outcome.operation, outcome.kind) {
        (_, OutcomeKind::Rejected) => "Invalid command".to_string(),
        (Operation::Ping, _) if ok => "Device online".to_string(),
        (Operation::Ping, _) => "Cannot reach device".to_string(),
        (Operation::Status, _) if ok => "System status".to_string(),
        (Operation::Status, _) => "Status unavailable".to_string(),
        (Operation::Automation { enabled }, _) if ok => {
            format!("Automation {}", if enabled { "enabled" } else { "disabled" })
        }
        (Operation::Pump { desired: Some(action) }, _) if ok => {
            format!("Pump switched {}", action.as_str())
        }
        (Operation::Pump { .. }, OutcomeKind::NotConfirmed) => {
            "Pump command not applied".to_string()
        }
        (Operation::SetMinMoisture, _) if ok => "Minimum moisture updated".to_string(),
        (Operation::Reboot, _) if ok => "Device back online".to_string(),
        (Operation::Reboot, OutcomeKind::Unresponsive) => "Device still unresponsive".to_string(),
        (Operation::Diagnostic, _) if ok => "Diagnostics passed".to_string(),
        (Operation::Diagnostic, _) => "Diagnostics found problems".to_string(),
        (Operation::Help, _) => "Available commands".to_string(),
        _ => "Command failed".to_string(),
    }
}

fn severity_for(kind: OutcomeKind) -> Severity {
    match kind {
        OutcomeKind::Completed => Severity::Ok,
        OutcomeKind::Rejected => Severity::Warning,
        OutcomeKind::NotConfirmed | OutcomeKind::DeviceFailed | OutcomeKind::Unresponsive => {
            Severity::Error
        }
    }
}

pub fn outcome(outcome: &CommandOutcome) -> Notification {
    if outcome.operation == Operation::Help && outcome.success() {
        return help();
    }
    let severity = match outcome.operation {
        Operation::Status | Operation::Help if outcome.success() => Severity::Info,
        _ => severity_for(outcome.kind),
    };
    let mut notification = Notification::new(title_for(outcome), outcome.message.clone(), severity);

    if let Some(before) = &outcome.before {
        notification = notification.field("Pump before", on_off(before.pump), true);
    }

    if let Some(after) = &outcome.after {
        notification = match outcome.operation {
            Operation::Status => status_fields(notification, after),
            Operation::Ping => notification
                .field("IP", after.ip.clone(), true)
                .field("Moisture", moisture(after), true)
                .field(
                    "Automation",
                    if after.automation_enabled {
                        "enabled"
                    } else {
                        "disabled"
                    },
                    true,
                ),
            Operation::Pump { .. } => notification
                .field("Pump after", on_off(after.pump), true)
                .field("Moisture", moisture(after), true),
            _ => notification
                .field("Moisture", moisture(after), true)
                .field("Pump", on_off(after.pump), true),
        };
    }

    for probe in &outcome.probes {
        let mark = if probe.passed { "pass" } else { "fail" };
        notification = notification.field(probe.name, format!("{mark}: {}", probe.detail), false);
    }

    notification
}

pub fn heartbeat(event: &HeartbeatEvent) -> Notification {
    match event {
        HeartbeatEvent::Healthy(report) => {
            Notification::new("Heartbeat ok", "Device is responding normally", Severity::Ok)
                .field("Moisture", moisture(report), true)
                .field("Pump", on_off(report.pump), true)
                .field("IP", report.ip.clone(), true)
                .field("Error", last_error(report), false)
        }
        HeartbeatEvent::Unreachable(err) => Notification::new(
            "Device not responding",
            format!("```{}```", err.diagnostic()),
            Severity::Error,
        ),
    }
}

pub fn rebooting() -> Notification {
    Notification::new("Rebooting...", "Restart command sent to the device", Severity::Warning)
}

pub fn help() -> Notification {
    COMMAND_CATALOG.iter().fold(
        Notification::new("Available commands", "Smart farm control over chat", Severity::Info),
        |notification, (usage, description)| notification.field(usage, *description, false),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{error::DeviceError, types::PumpAction};

    fn report(pump: bool, last_error: Option<&str>) -> StatusReport {
        StatusReport {
            timestamp: "2025-08-17 09:15:00".to_string(),
            moisture: 37,
            pump,
            automation_enabled: true,
            wifi_connected: true,
            ip: "10.70.55.222".to_string(),
            last_error: last_error.map(str::to_string),
        }
    }

    #[test]
    fn healthy_heartbeat_shows_device_error_as_payload() {
        let event = HeartbeatEvent::Healthy(report(false, Some("sensor stuck")));
        let notification = heartbeat(&event);

        assert_eq!(notification.severity, Severity::Ok);
        assert_eq!(notification.field_value("Moisture"), Some("37%"));
        assert_eq!(notification.field_value("Pump"), Some("off"));
        assert_eq!(notification.field_value("Error"), Some("sensor stuck"));
    }

    #[test]
    fn unreachable_heartbeat_carries_diagnostic() {
        let event = HeartbeatEvent::Unreachable(DeviceError::Unreachable("timed out".into()));
        let notification = heartbeat(&event);

        assert_eq!(notification.severity, Severity::Error);
        assert!(notification.description.contains("device unreachable: timed out"));
    }

    #[test]
    fn status_outcome_renders_every_field() {
        let outcome = CommandOutcome::completed(Operation::Status, "Latest reading")
            .with_after(Some(report(true, None)));
        let notification = super::outcome(&outcome);

        assert_eq!(notification.title, "System status");
        assert_eq!(notification.severity, Severity::Info);
        assert_eq!(notification.fields.len(), 7);
        assert_eq!(notification.field_value("Error"), Some("None"));
        assert_eq!(notification.field_value("WiFi"), Some("connected"));
    }

    #[test]
    fn pump_not_confirmed_shows_before_and_after() {
        let outcome = CommandOutcome::not_confirmed(
            Operation::Pump {
                desired: Some(PumpAction::On),
            },
            "command did not take effect",
        )
        .with_before(Some(report(false, None)))
        .with_after(Some(report(false, None)));
        let notification = super::outcome(&outcome);

        assert_eq!(notification.title, "Pump command not applied");
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.field_value("Pump before"), Some("off"));
        assert_eq!(notification.field_value("Pump after"), Some("off"));
    }

    #[test]
    fn help_outcome_renders_catalog() {
        let notification = super::outcome(&CommandOutcome::completed(Operation::Help, ""));
        assert_eq!(notification.fields.len(), COMMAND_CATALOG.len());
    }

    #[test]
    fn help_lists_catalog() {
        let notification = help();
        assert_eq!(notification.fields.len(), COMMAND_CATALOG.len());
        assert_eq!(notification.footer, FOOTER);
    }

    #[test]
    fn plain_text_includes_fields() {
        let text = Notification::new("Title", "Body", Severity::Info)
            .field("Moisture", "40%", true)
            .to_plain_text();
        assert_eq!(text, "Title\nBody\n  Moisture: 40%");
    }
}
