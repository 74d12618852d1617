//! Push-notification transport.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use suivi_core::notification::{NotificationSender, PushMessage};
use thiserror::Error;

use crate::config::PushConfig;

#[derive(Debug, Error)]
pub enum PushError {
  #[error("push request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("push service answered {0}")]
  Status(StatusCode),

  #[error("push delivery is not configured")]
  Disabled,
}

/// Posts each message as JSON to the configured push endpoint.
#[derive(Clone)]
pub struct HttpPushSender {
  client: Client,
  config: PushConfig,
}

impl HttpPushSender {
  pub fn new(config: PushConfig) -> Result<Self, PushError> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self { client, config })
  }
}

impl NotificationSender for HttpPushSender {
  type Error = PushError;

  async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
    let resp = self
      .client
      .post(&self.config.endpoint)
      .bearer_auth(&self.config.api_key)
      .json(&serde_json::json!({ "message": message }))
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(PushError::Status(resp.status()));
    }
    Ok(())
  }
}

/// The sender the server runs with: HTTP when configured, otherwise a log
/// line per message, reported back as undelivered.
#[derive(Clone)]
pub enum PushSender {
  Http(HttpPushSender),
  Disabled,
}

impl PushSender {
  pub fn from_config(config: Option<PushConfig>) -> Result<Self, PushError> {
    match config {
      Some(config) => Ok(Self::Http(HttpPushSender::new(config)?)),
      None => {
        tracing::warn!("no [push] section configured, notifications will only be logged");
        Ok(Self::Disabled)
      }
    }
  }
}

impl NotificationSender for PushSender {
  type Error = PushError;

  async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
    match self {
      Self::Http(sender) => sender.send(message).await,
      Self::Disabled => {
        tracing::info!(
          kind = ?message.data.kind,
          title = %message.title,
          "push disabled, message dropped"
        );
        Err(PushError::Disabled)
      }
    }
  }
}
