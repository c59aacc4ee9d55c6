use std::time::Duration;

use async_trait::async_trait;
use irrigation_common::{
    CommandReply, DeviceEndpoint, DeviceError, StatusReport, COMMAND_QUERY_KEY,
};
use reqwest::{Client, StatusCode, Url};
use tokio::net::TcpStream;
use tracing::debug;

const MAX_ERROR_BODY_CHARS: usize = 100;
const FIRE_AND_FORGET_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait DeviceApi: Send + Sync {
    async fn ping(&self) -> Result<(), DeviceError>;

    async fn fetch_status(&self) -> Result<StatusReport, DeviceError>;

    async fn send_command(&self, cmd: &str) -> Result<CommandReply, DeviceError>;

    /// Sends a command without reading the reply; the outcome is discarded.
    async fn fire_command(&self, cmd: &str);

    async fn probe_tcp(&self) -> Result<(), DeviceError>;
}

#[derive(Debug, Clone)]
pub struct HttpDevice {
    endpoint: DeviceEndpoint,
    timeout: Duration,
}

impl HttpDevice {
    pub fn new(endpoint: DeviceEndpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    // A fresh client per call with no idle pool: nothing outlives the request.
    fn client(&self, timeout: Duration) -> Result<Client, DeviceError> {
        Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|err| DeviceError::Unreachable(format!("http client setup failed: {err}")))
    }

    async fn get(&self, url: &str, cmd: Option<&str>) -> Result<Vec<u8>, DeviceError> {
        let client = self.client(self.timeout)?;
        let mut request = client.get(url);
        if let Some(cmd) = cmd {
            request = request.query(&[(COMMAND_QUERY_KEY, cmd)]);
        }

        let response = request
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(http_status_error(status, &text));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(err))?;
        Ok(body.to_vec())
    }

    fn transport_error(&self, err: reqwest::Error) -> DeviceError {
        if err.is_timeout() {
            DeviceError::Unreachable(format!("timed out after {}s", self.timeout.as_secs_f32()))
        } else if err.is_connect() {
            DeviceError::Unreachable(format!("connection failed: {}", root_cause(&err)))
        } else if err.is_decode() {
            DeviceError::MalformedResponse(err.to_string())
        } else {
            DeviceError::Unreachable(root_cause(&err))
        }
    }
}

#[async_trait]
impl DeviceApi for HttpDevice {
    async fn ping(&self) -> Result<(), DeviceError> {
        let client = self.client(self.timeout)?;
        let response = client
            .get(self.endpoint.ping_url())
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(http_status_error(status, &text))
        }
    }

    async fn fetch_status(&self) -> Result<StatusReport, DeviceError> {
        let body = self.get(&self.endpoint.status_url(), None).await?;
        StatusReport::from_json(&body)
    }

    async fn send_command(&self, cmd: &str) -> Result<CommandReply, DeviceError> {
        let body = self.get(&self.endpoint.command_url(), Some(cmd)).await?;
        CommandReply::from_json(&body)
    }

    async fn fire_command(&self, cmd: &str) {
        let timeout = self.timeout.min(FIRE_AND_FORGET_TIMEOUT);
        let client = match self.client(timeout) {
            Ok(client) => client,
            Err(err) => {
                debug!("fire-and-forget {cmd} not sent: {err}");
                return;
            }
        };

        let result = client
            .get(self.endpoint.command_url())
            .query(&[(COMMAND_QUERY_KEY, cmd)])
            .send()
            .await;
        match result {
            Ok(response) => debug!("fire-and-forget {cmd} answered {}", response.status()),
            Err(err) => debug!("fire-and-forget {cmd} dropped: {err}"),
        }
    }

    async fn probe_tcp(&self) -> Result<(), DeviceError> {
        let url = Url::parse(&self.endpoint.base_url())
            .map_err(|err| DeviceError::Unreachable(format!("invalid device address: {err}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| DeviceError::Unreachable("device address has no host".to_string()))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);

        match tokio::time::timeout(self.timeout, TcpStream::connect((host.as_str(), port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(err)) => Err(DeviceError::Unreachable(format!(
                "tcp connect to {host}:{port} failed: {err}"
            ))),
            Err(_) => Err(DeviceError::Unreachable(format!(
                "tcp connect to {host}:{port} timed out"
            ))),
        }
    }
}

fn http_status_error(status: StatusCode, body: &str) -> DeviceError {
    DeviceError::HttpStatus {
        code: status.as_u16(),
        detail: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

fn root_cause(err: &reqwest::Error) -> String {
    let mut source: &dyn std::error::Error = err;
    while let Some(next) = source.source() {
        source = next;
    }
    source.to_string()
}
