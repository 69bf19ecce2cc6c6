//! Phone messages: one templated message to each person being celebrated
//! who has a usable phone number.

use roster_core::{
  blob::BlobStore,
  date::MonthDay,
  message::{MessageSender, PhoneMessage},
  store::RecordStore,
};
use tracing::{debug, info, warn};

use crate::{DispatchReport, Notifier, render::DigestRenderer};

impl<S, R> Notifier<S, R>
where
  S: RecordStore + BlobStore + 'static,
  R: DigestRenderer,
{
  /// One message per occasion on `date` whose subject has a phone number.
  /// Placeholder numbers never get this far; the matcher drops them.
  pub async fn prepare_messages(&self, date: MonthDay) -> Vec<PhoneMessage> {
    self
      .occasions_by_kind(date)
      .await
      .into_iter()
      .flat_map(|(_, occasions)| occasions)
      .filter_map(|occasion| {
        let Some(number) = occasion.phone.as_deref().map(str::trim).filter(|n| !n.is_empty())
        else {
          debug!(id = %occasion.subject_id, "no phone; message skipped");
          return None;
        };
        Some(PhoneMessage {
          number:     number.to_owned(),
          subject_id: occasion.subject_id,
          kind:       occasion.kind,
        })
      })
      .collect()
  }

  /// Prepare and send the phone messages for `date`.
  pub async fn send_messages<M>(&self, date: MonthDay, sender: &M) -> DispatchReport
  where
    M: MessageSender,
  {
    let messages = self.prepare_messages(date).await;
    info!(%date, messages = messages.len(), "sending phone messages");

    let mut report = DispatchReport::default();
    for message in messages {
      let (number, id) = (message.number.clone(), message.subject_id);
      match sender.send_message(message).await {
        Ok(()) => {
          info!(%number, %id, "message sent");
          report.sent += 1;
        }
        Err(e) => {
          warn!(%number, %id, error = %e, "message not sent");
          report.failed += 1;
        }
      }
    }

    info!(sent = report.sent, failed = report.failed, "phone messages dispatched");
    report
  }
}
