use crate::{
    error::DeviceError,
    types::{PumpAction, StatusReport},
    verify::VerifyPhase,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ping,
    Status,
    Automation { enabled: bool },
    Pump { desired: Option<PumpAction> },
    SetMinMoisture,
    Reboot,
    Diagnostic,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Completed,
    Rejected,
    NotConfirmed,
    DeviceFailed,
    Unresponsive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl ProbeResult {
    pub fn from_result<T>(name: &'static str, result: &Result<T, DeviceError>) -> Self {
        match result {
            Ok(_) => Self {
                name,
                passed: true,
                detail: "ok".to_string(),
            },
            Err(err) => Self {
                name,
                passed: false,
                detail: err.diagnostic(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub operation: Operation,
    pub kind: OutcomeKind,
    pub message: String,
    pub before: Option<StatusReport>,
    pub after: Option<StatusReport>,
    pub phase: Option<VerifyPhase>,
    pub probes: Vec<ProbeResult>,
}

impl CommandOutcome {
    fn new(operation: Operation, kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            before: None,
            after: None,
            phase: None,
            probes: Vec::new(),
        }
    }

    pub fn completed(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, OutcomeKind::Completed, message)
    }

    pub fn rejected(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, OutcomeKind::Rejected, message)
    }

    pub fn not_confirmed(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, OutcomeKind::NotConfirmed, message)
    }

    pub fn unresponsive(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, OutcomeKind::Unresponsive, message)
    }

    pub fn failed(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, OutcomeKind::DeviceFailed, message)
    }

    pub fn device_failed(operation: Operation, err: &DeviceError) -> Self {
        Self::failed(operation, err.diagnostic())
    }

    pub fn with_before(mut self, report: Option<StatusReport>) -> Self {
        self.before = report;
        self
    }

    pub fn with_after(mut self, report: Option<StatusReport>) -> Self {
        self.after = report;
        self
    }

    pub fn with_phase(mut self, phase: VerifyPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_probes(mut self, probes: Vec<ProbeResult>) -> Self {
        self.probes = probes;
        self
    }

    pub fn success(&self) -> bool {
        self.kind == OutcomeKind::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatEvent {
    Healthy(StatusReport),
    Unreachable(DeviceError),
}

impl HeartbeatEvent {
    pub fn from_result(result: Result<StatusReport, DeviceError>) -> Self {
        match result {
            Ok(report) => Self::Healthy(report),
            Err(err) => Self::Unreachable(err),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy(_))
    }
}
