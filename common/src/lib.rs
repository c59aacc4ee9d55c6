pub mod command;
pub mod config;
pub mod error;
pub mod outcome;
pub mod render;
pub mod routes;
pub mod types;
pub mod verify;

pub use command::{ChatCommand, COMMAND_CATALOG, COMMAND_PREFIX};
pub use config::{
    ChatConfig, DeviceEndpoint, FailurePolicy, HeartbeatConfig, RelayConfig, TimingConfig,
};
pub use error::{ConfigError, DeviceError, DeviceErrorKind};
pub use outcome::{CommandOutcome, HeartbeatEvent, Operation, OutcomeKind, ProbeResult};
pub use render::{Notification, Severity};
pub use routes::*;
pub use types::{CommandReply, PumpAction, StatusReport, MAX_MOISTURE_PERCENT};
pub use verify::{StepResult, VerifyPhase};
