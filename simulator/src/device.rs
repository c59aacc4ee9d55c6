use irrigation_common::{
    routes::{
        CMD_OFF, CMD_ON, CMD_PUMP_OFF, CMD_PUMP_ON, CMD_REBOOT, CMD_SET_MIN_MOISTURE_PREFIX,
    },
    StatusReport, MAX_MOISTURE_PERCENT,
};

const DRY_RATE_PER_SEC: f32 = 0.05;
const WET_RATE_PER_SEC: f32 = 1.5;
const AUTO_OFF_MARGIN: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    moisture: f32,
    pump: bool,
    enabled: bool,
    min_moisture: u8,
    wifi: bool,
    ip: String,
    last_error: Option<String>,
    rebooting_until_ms: Option<u64>,
}

impl SimulatedDevice {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            moisture: 45.0,
            pump: false,
            enabled: true,
            min_moisture: 30,
            wifi: true,
            ip: ip.into(),
            last_error: None,
            rebooting_until_ms: None,
        }
    }

    pub fn is_available(&mut self, now_ms: u64) -> bool {
        match self.rebooting_until_ms {
            Some(until) if now_ms < until => false,
            Some(_) => {
                self.rebooting_until_ms = None;
                true
            }
            None => true,
        }
    }

    pub fn status(&self, time: String) -> StatusReport {
        StatusReport {
            timestamp: time,
            moisture: self.moisture.round().clamp(0.0, MAX_MOISTURE_PERCENT as f32) as u8,
            pump: self.pump,
            automation_enabled: self.enabled,
            wifi_connected: self.wifi,
            ip: self.ip.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn min_moisture(&self) -> u8 {
        self.min_moisture
    }

    pub fn apply_command(
        &mut self,
        cmd: &str,
        now_ms: u64,
        reboot_ms: u64,
    ) -> Result<String, String> {
        match cmd {
            CMD_ON => {
                self.enabled = true;
                Ok("System ON".to_string())
            }
            CMD_OFF => {
                self.enabled = false;
                Ok("System OFF".to_string())
            }
            CMD_PUMP_ON => {
                self.pump = true;
                Ok("Pump ON".to_string())
            }
            CMD_PUMP_OFF => {
                self.pump = false;
                Ok("Pump OFF".to_string())
            }
            CMD_REBOOT => {
                self.pump = false;
                self.last_error = None;
                self.rebooting_until_ms = Some(now_ms.saturating_add(reboot_ms));
                Ok("Rebooting".to_string())
            }
            other => {
                let Some(raw) = other.strip_prefix(CMD_SET_MIN_MOISTURE_PREFIX) else {
                    return Err(format!("Unknown command: {other}"));
                };
                match raw.parse::<u8>() {
                    Ok(value) if value <= MAX_MOISTURE_PERCENT => {
                        self.min_moisture = value;
                        Ok(format!("Minimum moisture set to {value}%"))
                    }
                    _ => {
                        self.last_error = Some(format!("rejected threshold {raw}"));
                        Err(format!("Invalid threshold: {raw}"))
                    }
                }
            }
        }
    }

    pub fn tick(&mut self, elapsed_secs: f32) {
        if self.pump {
            self.moisture += WET_RATE_PER_SEC * elapsed_secs;
        } else {
            self.moisture -= DRY_RATE_PER_SEC * elapsed_secs;
        }
        self.moisture = self.moisture.clamp(0.0, MAX_MOISTURE_PERCENT as f32);

        if self.enabled {
            let min = self.min_moisture as f32;
            if self.moisture < min {
                self.pump = true;
            } else if self.moisture >= min + AUTO_OFF_MARGIN {
                self.pump = false;
            }
        }
    }
}
