//! Occasion notifications: the daily digest mailed to every active member,
//! personal greetings mailed to the people being celebrated, and phone
//! messages to the same people.
//!
//! All go through [`roster_core::matcher::find_occasions`]; this crate only
//! decides which images to attach and who receives what.

pub mod digest;
pub mod error;
pub mod greetings;
pub mod images;
pub mod mailer;
pub mod messenger;
pub mod phone;
pub mod render;

use std::{sync::Arc, time::Duration};

use roster_core::{
  blob::BlobStore,
  date::MonthDay,
  mail::{MailSender, OutgoingMail},
  matcher::find_occasions,
  occasion::{MatchKind, Occasion},
  store::RecordStore,
};
use serde::Serialize;
use tracing::{info, warn};

pub use digest::{Digest, DigestCard, DigestSection};
pub use error::{Error, Result};
pub use greetings::Greeting;
pub use mailer::{MailConfig, SmtpMailer};
pub use messenger::{HttpMessenger, MessageConfig};
pub use render::{DigestRenderer, PlainRenderer};

pub const DEFAULT_SUBJECT_PREFIX: &str = "Birthday and Anniversary Notification";

// ─── Options ─────────────────────────────────────────────────────────────────

/// Knobs for digest and greeting assembly.
#[derive(Debug, Clone)]
pub struct NotifyOptions {
  /// Blob shown for anyone without a usable personal image.
  pub fallback_image:      String,
  /// Blob attached once at the top of the digest.
  pub banner_image:        Option<String>,
  pub blob_fetch_attempts: u32,
  pub blob_retry_delay:    Duration,
  /// Digest subject; the long form of the date is appended.
  pub subject_prefix:      String,
  /// Blind copy added to every personal greeting.
  pub greeting_bcc:        Option<String>,
}

impl Default for NotifyOptions {
  fn default() -> Self {
    Self {
      fallback_image:      "0.jpg".to_owned(),
      banner_image:        None,
      blob_fetch_attempts: 3,
      blob_retry_delay:    Duration::from_millis(200),
      subject_prefix:      DEFAULT_SUBJECT_PREFIX.to_owned(),
      greeting_bcc:        None,
    }
  }
}

/// Outcome of a batch send. Individual failures never abort the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
  pub sent:   usize,
  pub failed: usize,
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// Assembles and sends notifications from a store that holds both the roster
/// records and their images.
pub struct Notifier<S, R = PlainRenderer> {
  store:    Arc<S>,
  renderer: R,
  options:  NotifyOptions,
}

impl<S> Notifier<S> {
  pub fn new(store: Arc<S>, options: NotifyOptions) -> Self {
    Self { store, renderer: PlainRenderer, options }
  }
}

impl<S, R> Notifier<S, R> {
  /// Swap the HTML renderer.
  pub fn with_renderer<R2: DigestRenderer>(self, renderer: R2) -> Notifier<S, R2> {
    Notifier { store: self.store, renderer, options: self.options }
  }

  pub fn options(&self) -> &NotifyOptions { &self.options }
}

impl<S, R> Notifier<S, R>
where
  S: RecordStore + BlobStore + 'static,
  R: DigestRenderer,
{
  /// Run all three match kinds concurrently. A kind whose query fails
  /// contributes no occasions.
  pub(crate) async fn occasions_by_kind(&self, date: MonthDay) -> Vec<(MatchKind, Vec<Occasion>)> {
    let store = self.store.as_ref();
    let (members, spouses, anniversaries) = tokio::join!(
      find_occasions(store, date, MatchKind::MemberBirthday),
      find_occasions(store, date, MatchKind::SpouseBirthday),
      find_occasions(store, date, MatchKind::Anniversary),
    );

    MatchKind::ALL
      .into_iter()
      .zip([members, spouses, anniversaries])
      .map(|(kind, found)| match found {
        Ok(occasions) => (kind, occasions),
        Err(e) => {
          warn!(%kind, %date, error = %e, "section unavailable; leaving it empty");
          (kind, Vec::new())
        }
      })
      .collect()
  }
}

/// Send each message in turn, counting successes and failures.
pub(crate) async fn dispatch<M, I>(mailer: &M, mails: I) -> DispatchReport
where
  M: MailSender,
  I: IntoIterator<Item = OutgoingMail>,
{
  let mut report = DispatchReport::default();
  for mail in mails {
    let to = mail.to.clone();
    match mailer.send(mail).await {
      Ok(()) => {
        info!(%to, "mail sent");
        report.sent += 1;
      }
      Err(e) => {
        warn!(%to, error = %e, "mail not sent");
        report.failed += 1;
      }
    }
  }
  report
}
