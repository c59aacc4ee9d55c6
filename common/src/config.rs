use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    routes::{ROUTE_COMMAND, ROUTE_PING, ROUTE_STATUS},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub host: String,
    pub ping_path: String,
    pub status_path: String,
    pub command_path: String,
}

impl DeviceEndpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ping_path: ROUTE_PING.to_string(),
            status_path: ROUTE_STATUS.to_string(),
            command_path: ROUTE_COMMAND.to_string(),
        }
    }

    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub fn ping_url(&self) -> String {
        self.url(&self.ping_path)
    }

    pub fn status_url(&self) -> String {
        self.url(&self.status_path)
    }

    pub fn command_url(&self) -> String {
        self.url(&self.command_path)
    }
}

impl Default for DeviceEndpoint {
    fn default() -> Self {
        Self::new("10.70.55.222")
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub channel_id: u64,
    pub token: String,
    pub api_base: String,
    pub log_only: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            channel_id: 1_406_180_111_358_885_928,
            token: String::new(),
            api_base: "https://discord.com/api/v10".to_string(),
            log_only: false,
        }
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("channel_id", &self.channel_id)
            .field("token_set", &!self.token.is_empty())
            .field("api_base", &self.api_base)
            .field("log_only", &self.log_only)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailurePolicy {
    Alert,
    Reboot { after_failures: u32 },
}

impl FailurePolicy {
    pub fn should_reboot(self, consecutive_failures: u32) -> bool {
        match self {
            Self::Alert => false,
            Self::Reboot { after_failures } => consecutive_failures >= after_failures.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    pub interval_minutes: u64,
    pub failure_policy: FailurePolicy,
    pub ready_retry_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 1,
            failure_policy: FailurePolicy::Alert,
            ready_retry_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub request_timeout_secs: u64,
    pub pump_settle_secs: u64,
    pub reboot_grace_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            pump_settle_secs: 2,
            reboot_grace_secs: 33,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    pub device: DeviceEndpoint,
    pub chat: ChatConfig,
    pub heartbeat: HeartbeatConfig,
    pub timing: TimingConfig,
}

impl RelayConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = non_empty(lookup("ESP32_IP")) {
            config.device = DeviceEndpoint::new(host);
        }
        if let Some(value) = parse_var::<u64, _>(&lookup, "DISCORD_CHANNEL_ID")? {
            config.chat.channel_id = value;
        }
        if let Some(base) = non_empty(lookup("DISCORD_API_BASE")) {
            config.chat.api_base = base.trim_end_matches('/').to_string();
        }
        config.chat.token = non_empty(lookup("DISCORD_TOKEN")).ok_or(ConfigError::MissingToken)?;
        config.chat.log_only = parse_bool(&lookup, "RELAY_LOG_ONLY")?.unwrap_or(false);

        if let Some(value) = parse_var(&lookup, "HEARTBEAT_INTERVAL")? {
            config.heartbeat.interval_minutes = value;
        }
        if let Some(value) = parse_var(&lookup, "DEVICE_TIMEOUT_SECS")? {
            config.timing.request_timeout_secs = value;
        }
        if let Some(value) = parse_var(&lookup, "PUMP_SETTLE_SECS")? {
            config.timing.pump_settle_secs = value;
        }
        if let Some(value) = parse_var(&lookup, "REBOOT_GRACE_SECS")? {
            config.timing.reboot_grace_secs = value;
        }

        let auto_reboot = parse_bool(&lookup, "AUTO_REBOOT_ON_FAILURE")?.unwrap_or(false);
        if auto_reboot {
            let after_failures = parse_var(&lookup, "AUTO_REBOOT_AFTER_FAILURES")?.unwrap_or(1);
            config.heartbeat.failure_policy = FailurePolicy::Reboot { after_failures };
        }

        config.sanitize();
        Ok(config)
    }

    pub fn sanitize(&mut self) {
        self.heartbeat.interval_minutes = self.heartbeat.interval_minutes.clamp(1, 1_440);
        self.heartbeat.ready_retry_secs = self.heartbeat.ready_retry_secs.clamp(1, 300);
        if let FailurePolicy::Reboot { after_failures } = &mut self.heartbeat.failure_policy {
            *after_failures = (*after_failures).clamp(1, 60);
        }

        self.timing.request_timeout_secs = self.timing.request_timeout_secs.clamp(5, 10);
        self.timing.pump_settle_secs = self.timing.pump_settle_secs.min(30);
        self.timing.reboot_grace_secs = self.timing.reboot_grace_secs.clamp(30, 45);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(None),
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn token_is_required() {
        let err = RelayConfig::from_lookup(lookup_from(&[("ESP32_IP", "10.0.0.5")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingToken);

        let err = RelayConfig::from_lookup(lookup_from(&[("DISCORD_TOKEN", "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingToken);
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = RelayConfig::from_lookup(lookup_from(&[("DISCORD_TOKEN", "abc")])).unwrap();

        assert_eq!(config.device.host, "10.70.55.222");
        assert_eq!(config.chat.channel_id, 1_406_180_111_358_885_928);
        assert_eq!(config.heartbeat.interval_minutes, 1);
        assert_eq!(config.heartbeat.failure_policy, FailurePolicy::Alert);
        assert_eq!(config.timing.pump_settle_secs, 2);
        assert_eq!(config.timing.reboot_grace_secs, 33);
    }

    #[test]
    fn reads_policy_and_timing_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("ESP32_IP", "192.168.4.1:8081"),
            ("DISCORD_CHANNEL_ID", "42"),
            ("HEARTBEAT_INTERVAL", "5"),
            ("PUMP_SETTLE_SECS", "4"),
            ("AUTO_REBOOT_ON_FAILURE", "true"),
            ("AUTO_REBOOT_AFTER_FAILURES", "3"),
        ]))
        .unwrap();

        assert_eq!(config.device.status_url(), "http://192.168.4.1:8081/status");
        assert_eq!(config.chat.channel_id, 42);
        assert_eq!(config.heartbeat.interval_minutes, 5);
        assert_eq!(config.timing.pump_settle_secs, 4);
        assert_eq!(
            config.heartbeat.failure_policy,
            FailurePolicy::Reboot { after_failures: 3 }
        );
    }

    #[test]
    fn invalid_numbers_are_reported_with_their_key() {
        let err = RelayConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("HEARTBEAT_INTERVAL", "soon"),
        ]))
        .unwrap_err();

        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "HEARTBEAT_INTERVAL",
                value: "soon".to_string(),
            }
        );
    }

    #[test]
    fn sanitize_clamps_timing_into_supported_ranges() {
        let mut config = RelayConfig::default();
        config.timing.request_timeout_secs = 60;
        config.timing.reboot_grace_secs = 5;
        config.heartbeat.interval_minutes = 0;
        config.sanitize();

        assert_eq!(config.timing.request_timeout_secs, 10);
        assert_eq!(config.timing.reboot_grace_secs, 30);
        assert_eq!(config.heartbeat.interval_minutes, 1);
    }

    #[test]
    fn endpoint_keeps_explicit_scheme() {
        let endpoint = DeviceEndpoint::new("https://farm.example.com/");
        assert_eq!(endpoint.ping_url(), "https://farm.example.com/ping");
        assert_eq!(endpoint.command_url(), "https://farm.example.com/command");
    }

    #[test]
    fn failure_policy_threshold() {
        assert!(!FailurePolicy::Alert.should_reboot(10));
        let policy = FailurePolicy::Reboot { after_failures: 2 };
        assert!(!policy.should_reboot(1));
        assert!(policy.should_reboot(2));
    }

    #[test]
    fn debug_output_hides_token() {
        let chat = ChatConfig {
            token: "secret".to_string(),
            ..ChatConfig::default()
        };
        let rendered = format!("{chat:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("token_set: true"));
    }
}
