//! Outbound notifications for agents and operators.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Notification payloads. Serialized as the webhook body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A session is waiting for `to_agent_id` to accept it
    TransferRequested {
        transfer_id: String,
        /// Public session id
        session_id: String,
        from_agent_id: Option<String>,
        to_agent_id: String,
        reason: Option<String>,
    },
    /// Too many WAITING sessions have no agent
    WaitingBacklog { waiting: u64, threshold: u64 },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransferRequested { .. } => "transfer_requested",
            Self::WaitingBacklog { .. } => "waiting_backlog",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {0}")]
    Status(u16),
}

/// Delivery seam. Production uses [`NotificationDispatcher`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(notification = ?notification, "Notification");
        Ok(())
    }
}

/// Notification channel.
#[derive(Debug, Clone)]
pub enum NotificationChannel {
    Log,
    Webhook { url: String },
}

/// Fans a notification out to every configured channel.
pub struct NotificationDispatcher {
    channels: Vec<NotificationChannel>,
    http: reqwest::Client,
}

impl NotificationDispatcher {
    /// Dispatcher with the log channel only.
    pub fn new() -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            channels: vec![NotificationChannel::Log],
            http,
        })
    }

    pub fn with_channel(mut self, channel: NotificationChannel) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn channels(&self) -> &[NotificationChannel] {
        &self.channels
    }

    async fn post(&self, url: &str, notification: &Notification) -> Result<(), NotifyError> {
        let response = self.http.post(url).json(notification).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    /// Every channel is attempted; the first failure is returned.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut first_error = None;
        for channel in &self.channels {
            let outcome = match channel {
                NotificationChannel::Log => LogNotifier.notify(notification).await,
                NotificationChannel::Webhook { url } => self.post(url, notification).await,
            };
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
