//! [`HttpMessenger`]: posts [`PhoneMessage`]s to a message service.

use std::time::Duration;

use reqwest::Client;
use roster_core::message::{MessageSender, PhoneMessage};
use serde::Deserialize;

use crate::{Error, Result};

fn default_timeout_secs() -> u64 { 30 }

/// The `[messages]` table of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageConfig {
  /// Full URL the JSON body is posted to.
  pub endpoint:     String,
  /// Sent as `x-api-key`.
  pub api_key:      String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

/// Posts each message as `{"number", "id", "type"}` JSON.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpMessenger {
  client: Client,
  config: MessageConfig,
}

impl HttpMessenger {
  pub fn new(config: MessageConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(Error::message)?;
    Ok(Self { client, config })
  }
}

impl MessageSender for HttpMessenger {
  type Error = Error;

  async fn send_message(&self, message: PhoneMessage) -> Result<()> {
    self
      .client
      .post(&self.config.endpoint)
      .header("x-api-key", &self.config.api_key)
      .json(&message)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(Error::message)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use roster_core::{occasion::OccasionKind, person::PersonId};
  use serde_json::json;

  use super::*;

  #[test]
  fn message_body_uses_service_field_names() {
    let message = PhoneMessage {
      number:     "+91 98220 00000".into(),
      subject_id: PersonId(7),
      kind:       OccasionKind::Anniversary,
    };
    assert_eq!(
      serde_json::to_value(&message).unwrap(),
      json!({ "number": "+91 98220 00000", "id": 7, "type": "anniversary" })
    );
  }

  #[test]
  fn config_defaults_the_timeout() {
    let config: MessageConfig = serde_json::from_value(json!({
      "endpoint": "http://localhost:3000/api/send-message",
      "api_key": "k",
    }))
    .unwrap();
    assert_eq!(config.timeout_secs, 30);
    assert!(HttpMessenger::new(config).is_ok());
  }
}
