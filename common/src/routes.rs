pub const ROUTE_PING: &str = "/ping";
pub const ROUTE_STATUS: &str = "/status";
pub const ROUTE_COMMAND: &str = "/command";
pub const COMMAND_QUERY_KEY: &str = "cmd";

pub const CMD_ON: &str = "on";
pub const CMD_OFF: &str = "off";
pub const CMD_PUMP_ON: &str = "pump_on";
pub const CMD_PUMP_OFF: &str = "pump_off";
pub const CMD_REBOOT: &str = "reboot";
pub const CMD_SET_MIN_MOISTURE_PREFIX: &str = "set_min_moisture_";

pub fn set_min_moisture_command(value: u8) -> String {
    format!("{CMD_SET_MIN_MOISTURE_PREFIX}{value}")
}
