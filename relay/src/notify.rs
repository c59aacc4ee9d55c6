use std::time::Duration;

use async_trait::async_trait;
use irrigation_common::{ChatConfig, Notification, Severity};
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("chat api request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat api returned HTTP {code}: {detail}")]
    Rejected { code: u16, detail: String },
    #[error("output channel not ready: {0}")]
    NotReady(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn ready(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

pub struct DiscordNotifier {
    client: Client,
    config: ChatConfig,
}

impl DiscordNotifier {
    pub fn new(config: ChatConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, config })
    }

    fn channel_url(&self) -> String {
        format!("{}/channels/{}", self.config.api_base, self.config.channel_id)
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.config.token)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn ready(&self) -> Result<(), NotifyError> {
        let response = self
            .client
            .get(self.channel_url())
            .header("Authorization", self.authorization())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(NotifyError::NotReady(format!(
                "channel {} lookup returned HTTP {}: {detail}",
                self.config.channel_id,
                status.as_u16()
            )))
        }
    }

    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(format!("{}/messages", self.channel_url()))
            .header("Authorization", self.authorization())
            .json(&embed_payload(notification))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected {
                code: status.as_u16(),
                detail,
            })
        }
    }
}

pub fn embed_payload(notification: &Notification) -> Value {
    let fields: Vec<Value> = notification
        .fields
        .iter()
        .map(|field| {
            json!({
                "name": field.name,
                "value": field.value,
                "inline": field.inline,
            })
        })
        .collect();

    json!({
        "embeds": [{
            "title": notification.title,
            "description": notification.description,
            "color": notification.severity.color(),
            "timestamp": notification.timestamp.to_rfc3339(),
            "footer": { "text": notification.footer },
            "fields": fields,
        }]
    })
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let text = notification.to_plain_text();
        match notification.severity {
            Severity::Ok | Severity::Info => info!("{text}"),
            Severity::Warning => warn!("{text}"),
            Severity::Error => error!("{text}"),
        }
        Ok(())
    }
}
