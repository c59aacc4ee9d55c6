pub const COMMAND_PREFIX: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Ping,
    On,
    Off,
    Status,
    Pump(Option<String>),
    SetMin(Option<String>),
    Reboot,
    Test,
    Unknown(String),
}

pub const COMMAND_CATALOG: &[(&str, &str)] = &[
    ("/ping", "Check the connection to the device"),
    ("/on", "Enable automatic moisture control"),
    ("/off", "Disable automatic moisture control"),
    ("/status", "Show the current device status"),
    ("/pump on|off", "Manually switch the pump"),
    ("/setmin <0-100>", "Set the minimum moisture threshold"),
    ("/reboot", "Restart the device and wait for it to recover"),
    ("/test", "Run connection diagnostics"),
    ("/help", "Show this command list"),
];

impl ChatCommand {
    /// Returns `None` for lines that are not commands (no prefix or empty).
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.trim().strip_prefix(COMMAND_PREFIX)?;
        let mut parts = body.split_whitespace();
        let name = parts.next()?.to_ascii_lowercase();
        let arg = parts.next().map(str::to_string);

        let command = match name.as_str() {
            "help" => Self::Help,
            "ping" => Self::Ping,
            "on" => Self::On,
            "off" => Self::Off,
            "status" => Self::Status,
            "pump" => Self::Pump(arg),
            "setmin" => Self::SetMin(arg),
            "reboot" => Self::Reboot,
            "test" => Self::Test,
            _ => Self::Unknown(name),
        };
        Some(command)
    }
}
