pub mod console;
pub mod device;
pub mod heartbeat;
pub mod host;
pub mod notify;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod fake;

pub use device::{DeviceApi, HttpDevice};
pub use heartbeat::HeartbeatScheduler;
pub use notify::{DiscordNotifier, LogNotifier, Notifier, NotifyError};
pub use orchestrator::Orchestrator;
