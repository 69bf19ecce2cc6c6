//! HTTP server assembly and configuration for the roster.

use std::{path::PathBuf, time::Duration};

use axum::Router;
use chrono::FixedOffset;
use roster_api::AppState;
use roster_core::{blob::BlobStore, store::RecordStore};
use roster_notify::{MailConfig, MessageConfig, NotifyOptions};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("roster.db") }
fn default_utc_offset_minutes() -> i32 { 330 }
fn default_fallback_image() -> String { "0.jpg".to_owned() }
fn default_blob_fetch_attempts() -> u32 { 3 }
fn default_blob_retry_delay_ms() -> u64 { 200 }

/// Runtime configuration, deserialised from `config.toml` and `ROSTER_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// Local time zone as minutes east of UTC; decides what "today" is.
  #[serde(default = "default_utc_offset_minutes")]
  pub utc_offset_minutes:  i32,
  #[serde(default = "default_fallback_image")]
  pub fallback_image:      String,
  #[serde(default)]
  pub banner_image:        Option<String>,
  #[serde(default = "default_blob_fetch_attempts")]
  pub blob_fetch_attempts: u32,
  #[serde(default = "default_blob_retry_delay_ms")]
  pub blob_retry_delay_ms: u64,
  /// Outgoing mail; required only by the commands that send.
  #[serde(default)]
  pub mail:                Option<MailConfig>,
  /// Phone-message service; required only by `message`.
  #[serde(default)]
  pub messages:            Option<MessageConfig>,
}

impl ServerConfig {
  /// `None` if the configured offset is out of range.
  pub fn utc_offset(&self) -> Option<FixedOffset> {
    self
      .utc_offset_minutes
      .checked_mul(60)
      .and_then(FixedOffset::east_opt)
  }

  pub fn notify_options(&self) -> NotifyOptions {
    let mail = self.mail.as_ref();
    NotifyOptions {
      fallback_image:      self.fallback_image.clone(),
      banner_image:        self.banner_image.clone(),
      blob_fetch_attempts: self.blob_fetch_attempts,
      blob_retry_delay:    Duration::from_millis(self.blob_retry_delay_ms),
      subject_prefix:      mail.map_or_else(
        || NotifyOptions::default().subject_prefix,
        |m| m.subject_prefix.clone(),
      ),
      greeting_bcc:        mail.and_then(|m| m.bcc.clone()),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api`, with request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + BlobStore + 'static,
{
  Router::new()
    .nest("/api", roster_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}
