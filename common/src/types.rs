use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

pub const MAX_MOISTURE_PERCENT: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(rename = "time")]
    pub timestamp: String,
    pub moisture: u8,
    pub pump: bool,
    #[serde(rename = "enabled")]
    pub automation_enabled: bool,
    #[serde(rename = "wifi")]
    pub wifi_connected: bool,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl StatusReport {
    pub fn from_json(body: &[u8]) -> Result<Self, DeviceError> {
        let mut report: StatusReport = serde_json::from_slice(body)
            .map_err(|err| DeviceError::MalformedResponse(format!("status: {err}")))?;

        if report.moisture > MAX_MOISTURE_PERCENT {
            return Err(DeviceError::MalformedResponse(format!(
                "status: moisture {} out of range",
                report.moisture
            )));
        }

        if report
            .last_error
            .as_deref()
            .is_some_and(|value| value.trim().is_empty())
        {
            report.last_error = None;
        }

        Ok(report)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    #[serde(default)]
    pub message: Option<String>,
}

impl CommandReply {
    pub fn from_json(body: &[u8]) -> Result<Self, DeviceError> {
        serde_json::from_slice(body)
            .map_err(|err| DeviceError::MalformedResponse(format!("command: {err}")))
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PumpAction {
    On,
    Off,
}

impl PumpAction {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    pub fn command(self) -> &'static str {
        match self {
            Self::On => crate::routes::CMD_PUMP_ON,
            Self::Off => crate::routes::CMD_PUMP_OFF,
        }
    }
}
