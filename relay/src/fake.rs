use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use irrigation_common::{CommandReply, DeviceError, Notification, StatusReport};
use tokio::time::Instant;

use crate::{
    device::DeviceApi,
    notify::{NotifyError, Notifier},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Ping,
    Status,
    Command(String),
    Fire(String),
    Tcp,
}

/// Scripted device. Queued results are consumed in order; an empty queue
/// falls back to the default for that route.
pub struct FakeDevice {
    calls: Mutex<Vec<(Instant, Call)>>,
    pings: Mutex<VecDeque<Result<(), DeviceError>>>,
    statuses: Mutex<VecDeque<Result<StatusReport, DeviceError>>>,
    commands: Mutex<VecDeque<Result<CommandReply, DeviceError>>>,
    status_delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

pub fn report(pump: bool) -> StatusReport {
    StatusReport {
        timestamp: "2025-08-17 09:15:00".to_string(),
        moisture: 48,
        pump,
        automation_enabled: true,
        wifi_connected: true,
        ip: "10.70.55.222".to_string(),
        last_error: None,
    }
}

pub fn unreachable() -> DeviceError {
    DeviceError::Unreachable("connection refused".to_string())
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            pings: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            commands: Mutex::new(VecDeque::new()),
            status_delay: Mutex::new(Duration::ZERO),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn push_ping(&self, result: Result<(), DeviceError>) -> &Self {
        self.pings.lock().unwrap().push_back(result);
        self
    }

    pub fn push_status(&self, result: Result<StatusReport, DeviceError>) -> &Self {
        self.statuses.lock().unwrap().push_back(result);
        self
    }

    pub fn push_command(&self, result: Result<CommandReply, DeviceError>) -> &Self {
        self.commands.lock().unwrap().push_back(result);
        self
    }

    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

#[async_trait]
impl DeviceApi for FakeDevice {
    async fn ping(&self) -> Result<(), DeviceError> {
        self.record(Call::Ping);
        self.pings.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn fetch_status(&self) -> Result<StatusReport, DeviceError> {
        self.record(Call::Status);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(report(false)))
    }

    async fn send_command(&self, cmd: &str) -> Result<CommandReply, DeviceError> {
        self.record(Call::Command(cmd.to_string()));
        self.commands
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandReply::default()))
    }

    async fn fire_command(&self, cmd: &str) {
        self.record(Call::Fire(cmd.to_string()));
    }

    async fn probe_tcp(&self) -> Result<(), DeviceError> {
        self.record(Call::Tcp);
        Ok(())
    }
}

pub struct RecordingNotifier {
    ready: AtomicBool,
    reject_notify: AtomicBool,
    ready_checks: AtomicUsize,
    sent: Mutex<Vec<(Instant, Notification)>>,
}

impl RecordingNotifier {
    pub fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            reject_notify: AtomicBool::new(false),
            ready_checks: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_reject_notify(&self, reject: bool) {
        self.reject_notify.store(reject, Ordering::SeqCst);
    }

    pub fn ready_checks(&self) -> usize {
        self.ready_checks.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, notification)| notification.clone())
            .collect()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|notification| notification.title)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn ready(&self) -> Result<(), NotifyError> {
        self.ready_checks.fetch_add(1, Ordering::SeqCst);
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(NotifyError::NotReady("gateway not connected".to_string()))
        }
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.reject_notify.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                code: 502,
                detail: "bad gateway".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), notification.clone()));
        Ok(())
    }
}
